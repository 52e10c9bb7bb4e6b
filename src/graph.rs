use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::OnceLock;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;

use crate::bitset::AdjacencyBitset;
use crate::bond::{BondLabel, Site};
use crate::component::Component;
use crate::molecule::Molecule;

/// A graph of bonded molecules: either a concrete species or a rule pattern.
///
/// Every component of every molecule is a node of an undirected petgraph
/// arena (`sites`), laid out molecule by molecule so that the node of
/// `Site { mol, comp }` is `offsets[mol] + comp`. Bonds are edges carrying
/// their [`BondLabel`]; a site may hold several bonds at once. Each
/// [`Component`] mirrors its own bonds as label -> partner, and the two views
/// are only changed together through [`add_bond`](Self::add_bond),
/// [`delete_bond`](Self::delete_bond) and [`merge`](Self::merge).
///
/// The BNGL text form and the [`AdjacencyBitset`] are computed lazily and
/// dropped by every mutating method.
///
/// # Examples
///
/// ```
/// use bngcrab::{Component, Molecule, Site, SpeciesGraph};
///
/// let mut g = SpeciesGraph::from_molecules([
///     Molecule::new("L").with_component(Component::new("r")),
///     Molecule::new("R").with_component(Component::new("l")),
/// ]);
/// let label = g.add_bond(Site::new(0, 0), Site::new(1, 0), None);
/// assert_eq!(label, 1);
/// assert_eq!(g.to_string(), "L(r!1).R(l!1)");
/// assert!(g.has_bond(Site::new(1, 0), Site::new(0, 0)));
/// ```
#[derive(Clone, Default)]
pub struct SpeciesGraph {
    molecules: Vec<Molecule>,
    sites: UnGraph<Site, BondLabel>,
    offsets: Vec<usize>,
    compartment: Option<String>,
    text: OnceLock<String>,
    bitset: OnceLock<AdjacencyBitset>,
}

impl SpeciesGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an unbonded graph. Dangling bond labels on the components are
    /// kept; bonds between the molecules are added with
    /// [`add_bond`](Self::add_bond).
    pub fn from_molecules(molecules: impl IntoIterator<Item = Molecule>) -> Self {
        let mut graph = Self::new();
        for molecule in molecules {
            graph.push_molecule(molecule);
        }
        graph
    }

    pub fn with_compartment(mut self, compartment: impl Into<String>) -> Self {
        self.set_compartment(Some(compartment.into()));
        self
    }

    pub fn molecules(&self) -> &[Molecule] {
        &self.molecules
    }

    pub fn molecule(&self, idx: usize) -> &Molecule {
        &self.molecules[idx]
    }

    pub fn molecule_count(&self) -> usize {
        self.molecules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.molecules.is_empty()
    }

    pub fn component(&self, site: Site) -> &Component {
        &self.molecules[site.mol].components[site.comp]
    }

    /// Total number of components over all molecules.
    pub fn site_count(&self) -> usize {
        self.sites.node_count()
    }

    pub fn bond_count(&self) -> usize {
        self.sites.edge_count()
    }

    /// Species-level compartment (`@c:` prefix).
    pub fn compartment(&self) -> Option<&str> {
        self.compartment.as_deref()
    }

    /// Compartment of molecule `mol`: its own, else the species one. This is
    /// the compartment matching sees.
    pub fn molecule_compartment(&self, mol: usize) -> Option<&str> {
        self.molecules[mol]
            .compartment
            .as_deref()
            .or(self.compartment.as_deref())
    }

    /// Whether pattern molecule `mol` accepts molecule `t` of `target`,
    /// with both compartments resolved through [`Self::molecule_compartment`].
    pub fn molecule_accepts(&self, mol: usize, target: &SpeciesGraph, t: usize) -> bool {
        self.molecules[mol].accepts_in(
            self.molecule_compartment(mol),
            target.molecule(t),
            target.molecule_compartment(t),
        )
    }

    pub fn set_compartment(&mut self, compartment: Option<String>) {
        self.compartment = compartment;
        self.invalidate();
    }

    /// Appends a molecule and returns its index. Resolved bonds on the
    /// incoming components are dropped, dangling ones are kept.
    pub fn push_molecule(&mut self, mut molecule: Molecule) -> usize {
        for comp in &mut molecule.components {
            comp.clear_resolved_bonds();
        }
        self.insert_molecule(molecule)
    }

    fn insert_molecule(&mut self, molecule: Molecule) -> usize {
        let idx = self.molecules.len();
        self.offsets.push(self.sites.node_count());
        for comp in 0..molecule.components.len() {
            self.sites.add_node(Site::new(idx, comp));
        }
        self.molecules.push(molecule);
        self.invalidate();
        idx
    }

    fn node(&self, site: Site) -> NodeIndex {
        assert!(
            site.comp < self.molecules[site.mol].components.len(),
            "site {site} out of range"
        );
        NodeIndex::new(self.offsets[site.mol] + site.comp)
    }

    /// Bonds `a` and `b` under `label`, or under the next free label when
    /// `label` is `None`, zero or held anywhere except as a dangling end on
    /// `a` or `b`. Returns the label used. Bonding two sites that are already bonded returns the
    /// existing label and changes nothing.
    ///
    /// # Panics
    ///
    /// If either site is out of range or `a == b`.
    pub fn add_bond(&mut self, a: Site, b: Site, label: Option<BondLabel>) -> BondLabel {
        assert_ne!(a, b, "a site cannot bond to itself");
        let (na, nb) = (self.node(a), self.node(b));
        if let Some(edge) = self.sites.find_edge(na, nb) {
            return self.sites[edge];
        }
        let label = match label {
            Some(l) if self.label_free_for(l, a, b) => l,
            _ => self.next_bond_label(),
        };
        self.sites.add_edge(na, nb, label);
        self.molecules[a.mol].components[a.comp]
            .bonds
            .insert(label, Some(b));
        self.molecules[b.mol].components[b.comp]
            .bonds
            .insert(label, Some(a));
        self.invalidate();
        label
    }

    /// Removes every bond of `site`, including dangling ones, and the
    /// matching entries on all of its partners.
    pub fn delete_bond(&mut self, site: Site) {
        let node = self.node(site);
        loop {
            let Some((id, label, other)) = self.sites.edges(node).next().map(|e| {
                let other = if e.source() == node { e.target() } else { e.source() };
                (e.id(), *e.weight(), other)
            }) else {
                break;
            };
            let partner = self.sites[other];
            self.molecules[partner.mol].components[partner.comp]
                .bonds
                .remove(&label);
            self.sites.remove_edge(id);
        }
        self.molecules[site.mol].components[site.comp].bonds.clear();
        self.invalidate();
    }

    /// One more than the largest label in use, or the lowest free label once
    /// `BondLabel::MAX` is taken.
    pub fn next_bond_label(&self) -> BondLabel {
        self.fresh_labels(1).first().copied().unwrap_or(BondLabel::MAX)
    }

    fn used_labels(&self) -> BTreeSet<BondLabel> {
        self.molecules
            .iter()
            .flat_map(|m| &m.components)
            .flat_map(|c| c.bond_labels())
            .collect()
    }

    /// `label` is nonzero and at most sits dangling on `a` or `b`, so bonding
    /// them under it resolves those ends instead of aliasing another bond.
    fn label_free_for(&self, label: BondLabel, a: Site, b: Site) -> bool {
        label > 0
            && self.molecules.iter().enumerate().all(|(mol, m)| {
                m.components.iter().enumerate().all(|(comp, c)| match c.bonds.get(&label) {
                    None => true,
                    Some(None) => [a, b].contains(&Site::new(mol, comp)),
                    Some(Some(_)) => false,
                })
            })
    }

    /// `count` ascending labels unused in this graph. Labels above the current
    /// maximum come first; gaps below it are used only when the label space
    /// above is exhausted.
    fn fresh_labels(&self, count: usize) -> Vec<BondLabel> {
        let used = self.used_labels();
        let max = used.last().copied().unwrap_or(0);
        let mut out: Vec<BondLabel> = (max..BondLabel::MAX)
            .map(|l| l + 1)
            .take(count)
            .collect();
        if out.len() < count {
            let gaps = (1..max).filter(|l| !used.contains(l));
            out.extend(gaps.take(count - out.len()));
            out.sort_unstable();
        }
        out
    }

    pub fn set_component_state(&mut self, site: Site, state: Option<String>) {
        self.molecules[site.mol].components[site.comp].state = state;
        self.invalidate();
    }

    pub fn set_molecule_compartment(&mut self, mol: usize, compartment: Option<String>) {
        self.molecules[mol].compartment = compartment;
        self.invalidate();
    }

    /// Sites bonded to `site`.
    pub fn partners(&self, site: Site) -> impl Iterator<Item = Site> + '_ {
        self.sites
            .neighbors(self.node(site))
            .map(move |n| self.sites[n])
    }

    /// Whether `site` carries any bond, resolved or dangling.
    pub fn is_bound(&self, site: Site) -> bool {
        self.component(site).has_dangling_bond() || self.adjacency_bitset().row_any(site)
    }

    /// O(1) bond test through the adjacency bitset.
    pub fn has_bond(&self, a: Site, b: Site) -> bool {
        self.adjacency_bitset().contains(a, b)
    }

    /// Every resolved bond once, as `(site, site, label)`.
    pub fn bonds(&self) -> impl Iterator<Item = (Site, Site, BondLabel)> + '_ {
        self.sites
            .edge_references()
            .map(|e| (self.sites[e.source()], self.sites[e.target()], *e.weight()))
    }

    /// Distinct molecules bonded to `mol`, ascending, excluding `mol` itself.
    pub fn neighbor_molecules(&self, mol: usize) -> Vec<usize> {
        let start = self.offsets[mol];
        let mut out: Vec<usize> = (start..start + self.molecules[mol].components.len())
            .flat_map(|n| self.sites.neighbors(NodeIndex::new(n)))
            .map(|n| self.sites[n].mol)
            .filter(|&m| m != mol)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Molecule indices grouped by bond connectivity. Groups are ordered by
    /// their lowest member and each group is ascending.
    pub fn connected_components(&self) -> Vec<Vec<usize>> {
        let n = self.molecules.len();
        let mut uf = UnionFind::<usize>::new(n);
        for (a, b, _) in self.bonds() {
            uf.union(a.mol, b.mol);
        }
        let mut group_of_root = vec![usize::MAX; n];
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for mol in 0..n {
            let root = uf.find(mol);
            if group_of_root[root] == usize::MAX {
                group_of_root[root] = groups.len();
                groups.push(Vec::new());
            }
            groups[group_of_root[root]].push(mol);
        }
        groups
    }

    /// Appends deep copies of `other`'s molecules and bonds. `other`'s bond
    /// labels are renumbered onto labels unused in this graph, keeping their
    /// relative order. Returns the index of `other`'s first molecule in `self`.
    pub fn merge(&mut self, other: &SpeciesGraph) -> usize {
        let offset = self.molecules.len();
        let incoming = other.used_labels();
        let relabel: BTreeMap<BondLabel, BondLabel> = incoming
            .iter()
            .copied()
            .zip(self.fresh_labels(incoming.len()))
            .collect();
        assert_eq!(relabel.len(), incoming.len(), "bond label space exhausted");
        let relocate = |s: Site| Site::new(s.mol + offset, s.comp);

        for molecule in &other.molecules {
            let mut copy = molecule.clone();
            for comp in &mut copy.components {
                comp.bonds = comp
                    .bonds
                    .iter()
                    .map(|(label, &partner)| (relabel[label], partner.map(relocate)))
                    .collect();
            }
            self.insert_molecule(copy);
        }
        for (a, b, label) in other.bonds() {
            let (na, nb) = (self.node(relocate(a)), self.node(relocate(b)));
            self.sites.add_edge(na, nb, relabel[&label]);
        }
        self.invalidate();
        offset
    }

    /// One graph per connected component, molecules kept in their relative
    /// order, bond labels and the species compartment carried over.
    pub fn split(&self) -> Vec<SpeciesGraph> {
        let groups = self.connected_components();
        let mut placement = vec![(0usize, 0usize); self.molecules.len()];
        let mut graphs: Vec<SpeciesGraph> = Vec::with_capacity(groups.len());

        for (g, members) in groups.iter().enumerate() {
            let mut graph = SpeciesGraph::new();
            graph.compartment = self.compartment.clone();
            for (local, &mol) in members.iter().enumerate() {
                placement[mol] = (g, local);
                graph.push_molecule(self.molecules[mol].clone());
            }
            graphs.push(graph);
        }
        for (a, b, label) in self.bonds() {
            let (g, la) = placement[a.mol];
            let (_, lb) = placement[b.mol];
            graphs[g].add_bond(Site::new(la, a.comp), Site::new(lb, b.comp), Some(label));
        }
        graphs
    }

    /// The packed site adjacency matrix, rebuilt after any mutation.
    pub fn adjacency_bitset(&self) -> &AdjacencyBitset {
        self.bitset.get_or_init(|| {
            AdjacencyBitset::from_pairs(
                self.offsets.clone(),
                self.sites.node_count(),
                self.sites
                    .edge_references()
                    .map(|e| (e.source().index(), e.target().index())),
            )
        })
    }

    /// BNGL text of the graph, cached until the next mutation.
    pub fn text(&self) -> &str {
        self.text
            .get_or_init(|| crate::bngl::write_species_graph(self))
    }

    fn invalidate(&mut self) {
        self.text.take();
        self.bitset.take();
    }
}

/// Structural equality: same molecules in the same order, same bonds, same
/// compartment. Cached views do not take part.
impl PartialEq for SpeciesGraph {
    fn eq(&self, other: &Self) -> bool {
        self.compartment == other.compartment && self.molecules == other.molecules
    }
}

impl Eq for SpeciesGraph {}

impl fmt::Display for SpeciesGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl fmt::Debug for SpeciesGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeciesGraph")
            .field("molecule_count", &self.molecule_count())
            .field("bond_count", &self.bond_count())
            .field("text", &self.text())
            .finish()
    }
}
