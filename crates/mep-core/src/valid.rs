/// A type that can be checked for structural validity. Genomes, genes, and populations all
/// implement this; the evolution loop filters invalid individuals out of a generation rather
/// than letting them compete (§8 invariants).
pub trait Valid {
    fn is_valid(&self) -> bool {
        true
    }
}
