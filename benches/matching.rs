use criterion::{black_box, criterion_group, criterion_main, Criterion};

use bngcrab::{count_embedding_degeneracy, from_bngl, EnergyService, GraphMatcher, SpeciesGraph};

const EGFR_COMPLEX: &str = "EGF(R!1).EGFR(L!1,CR1!2,Y1068~P!3,Y1173~U).EGF(R!4).EGFR(L!4,CR1!2,Y1068~U,Y1173~P!5).Grb2(SH2!3,SH3!6).Sos(dom!6).Shc(PTB!5,Y317~U)";
const EGFR_PATTERN: &str = "EGFR(Y1068~P!1).Grb2(SH2!1,SH3!+)";
const DIMER_PATTERN: &str = "EGFR(CR1!1).EGFR(CR1!1)";
const RING6: &str = "A(l!6,r!1).A(l!1,r!2).A(l!2,r!3).A(l!3,r!4).A(l!4,r!5).A(l!5,r!6)";
const LINK: &str = "A(r!1).A(l!1)";

fn chain(n: usize) -> SpeciesGraph {
    let mut text = String::new();
    for i in 0..n {
        if i > 0 {
            text.push('.');
        }
        let left = if i == 0 { "l".to_string() } else { format!("l!{i}") };
        let right = if i + 1 == n { "r".to_string() } else { format!("r!{}", i + 1) };
        text.push_str(&format!("A({left},{right})"));
    }
    from_bngl(&text).unwrap()
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    group.bench_function("egfr_complex", |b| {
        b.iter(|| black_box(from_bngl(black_box(EGFR_COMPLEX)).unwrap()))
    });
    group.bench_function("ring6", |b| {
        b.iter(|| black_box(from_bngl(black_box(RING6)).unwrap()))
    });

    group.finish();
}

fn bench_find_all_maps(c: &mut Criterion) {
    let matcher = GraphMatcher::uncached();
    let egfr = from_bngl(EGFR_COMPLEX).unwrap();
    let egfr_pattern = from_bngl(EGFR_PATTERN).unwrap();
    let dimer = from_bngl(DIMER_PATTERN).unwrap();
    let ring = from_bngl(RING6).unwrap();
    let link = from_bngl(LINK).unwrap();
    let long_chain = chain(40);

    let mut group = c.benchmark_group("find_all_maps");

    group.bench_function("egfr_grb2", |b| {
        b.iter(|| black_box(matcher.find_all_maps(black_box(&egfr_pattern), black_box(&egfr))))
    });
    group.bench_function("egfr_dimer", |b| {
        b.iter(|| black_box(matcher.find_all_maps(black_box(&dimer), black_box(&egfr))))
    });
    group.bench_function("ring6_automorphisms", |b| {
        b.iter(|| black_box(matcher.find_all_maps(black_box(&ring), black_box(&ring))))
    });
    group.bench_function("link_in_chain40", |b| {
        b.iter(|| black_box(matcher.find_all_maps(black_box(&link), black_box(&long_chain))))
    });

    group.finish();
}

fn bench_cached(c: &mut Criterion) {
    let matcher = GraphMatcher::new();
    let egfr = from_bngl(EGFR_COMPLEX).unwrap();
    let pattern = from_bngl(EGFR_PATTERN).unwrap();
    matcher.find_all_maps(&pattern, &egfr);

    c.bench_function("find_all_maps_cache_hit", |b| {
        b.iter(|| black_box(matcher.find_all_maps(black_box(&pattern), black_box(&egfr))))
    });
}

fn bench_degeneracy(c: &mut Criterion) {
    let pattern = from_bngl("A(s,s,s)").unwrap();
    let target = from_bngl("A(s,s,s,s,s,s)").unwrap();
    let map = GraphMatcher::uncached()
        .find_first_map(&pattern, &target)
        .unwrap();

    c.bench_function("degeneracy_3_of_6", |b| {
        b.iter(|| black_box(count_embedding_degeneracy(&pattern, &target, black_box(&map))))
    });
}

fn bench_energy(c: &mut Criterion) {
    let service = EnergyService::new([
        ("EGFR(CR1!1).EGFR(CR1!1)", -3.0),
        ("EGFR(Y1068~P!1).Grb2(SH2!1)", -1.5),
        ("Grb2(SH3!1).Sos(dom!1)", -1.0),
        ("EGFR(Y1173~P)", 0.5),
    ]);
    let egfr = from_bngl(EGFR_COMPLEX).unwrap();

    c.bench_function("energy_egfr_complex", |b| {
        b.iter(|| black_box(service.calculate_energy(black_box(&egfr))))
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_find_all_maps,
    bench_cached,
    bench_degeneracy,
    bench_energy
);
criterion_main!(benches);
