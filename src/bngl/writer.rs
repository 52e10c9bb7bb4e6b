use std::fmt::Write;

use crate::component::Component;
use crate::graph::SpeciesGraph;
use crate::molecule::Molecule;

pub fn to_bngl(graph: &SpeciesGraph) -> String {
    write_species_graph(graph)
}

/// Writes molecules and components in stored order. Bond labels are written
/// as stored, so the text is stable for a given graph but not canonical.
///
/// The text is the matcher's cache key. Two graphs with equal text must
/// match identically, so everything matching reads has to be written here.
/// A molecule compartment equal to the species one is omitted because
/// matching resolves a missing molecule compartment to the species one
/// ([`SpeciesGraph::molecule_compartment`]). Each bond label names exactly
/// one bond, since the graph never reuses a label for a second pair.
pub(crate) fn write_species_graph(graph: &SpeciesGraph) -> String {
    let mut out = String::new();
    if let Some(c) = graph.compartment() {
        let _ = write!(out, "@{c}:");
    }
    for (i, molecule) in graph.molecules().iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        write_molecule(&mut out, molecule, graph.compartment());
    }
    out
}

fn write_molecule(out: &mut String, molecule: &Molecule, species_compartment: Option<&str>) {
    out.push_str(&molecule.name);
    if !molecule.components.is_empty() {
        out.push('(');
        for (i, comp) in molecule.components.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            write_component(out, comp);
        }
        out.push(')');
    } else if molecule.explicit_empty {
        out.push_str("()");
    }
    if let Some(c) = molecule.compartment.as_deref() {
        if Some(c) != species_compartment {
            let _ = write!(out, "@{c}");
        }
    }
    if let Some(label) = &molecule.label {
        let _ = write!(out, "%{label}");
    }
}

fn write_component(out: &mut String, comp: &Component) {
    out.push_str(&comp.name);
    if let Some(state) = &comp.state {
        let _ = write!(out, "~{state}");
    }
    for label in comp.bond_labels() {
        let _ = write!(out, "!{label}");
    }
    if let Some(wildcard) = comp.wildcard {
        out.push('!');
        out.push(wildcard.symbol());
    }
}
