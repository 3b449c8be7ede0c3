//! Run-summary persistence (§6 "run summary written as XML under `<stat_dir>/summary.xml`
//! when `--stat-summary` is set, with the best individual serialized as a list of
//! `(opcode, parameter?, arg_indices...)` rows preceded by genome dimensions and the
//! best-locus coordinates. Genomes reload by reading the same format and resolving opcodes
//! against the SymbolSet.").
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use mep_core::Fitness;
use mep_error::{MepResult, mep_err};
use mep_genome::Genome;
use mep_genome::codec::{self, GenomeRecord};
use mep_ops::SymbolSet;

use crate::xml::{extract_between, find_attr, tag_attrs};

/// Everything the CLI prints/writes about one finished run (§6 "run summary").
pub struct RunSummary<'a> {
    pub generations_run: usize,
    pub stopped: &'a str,
    pub best_fitness: &'a Fitness,
    pub best_genome: &'a Genome,
}

pub fn write_summary(path: &Path, summary: &RunSummary) -> MepResult<()> {
    let record = codec::encode(summary.best_genome);
    let mut xml = String::new();
    xml.push_str("<summary>\n");
    let _ = writeln!(
        xml,
        "  <run generations=\"{}\" stopped=\"{}\"/>",
        summary.generations_run,
        crate::xml::escape_attr(summary.stopped)
    );
    xml.push_str("  <fitness>\n");
    for value in summary.best_fitness.as_ref() {
        let _ = writeln!(xml, "    <value>{value}</value>");
    }
    xml.push_str("  </fitness>\n");
    let _ = writeln!(
        xml,
        "  <genome rows=\"{}\" categories=\"{}\" patch_length=\"{}\" best_index=\"{}\" best_category=\"{}\">",
        record.rows, record.categories, record.patch_length, record.best_index, record.best_category
    );
    for gene in &record.genes {
        let args = gene.args.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(",");
        let _ = writeln!(xml, "    <gene opcode=\"{}\" param=\"{}\" args=\"{}\"/>", gene.opcode, gene.param, args);
    }
    xml.push_str("  </genome>\n");
    xml.push_str("</summary>\n");

    fs::write(path, xml)?;
    Ok(())
}

/// Reloads a [`GenomeRecord`] from a file written by [`write_summary`], ready to be resolved
/// into a live [`Genome`] against a [`SymbolSet`] via [`codec::decode`].
pub fn read_summary(path: &Path, _sset: &SymbolSet) -> MepResult<GenomeRecord> {
    let content = fs::read_to_string(path)?;
    let genome_section = extract_between(&content, "<genome", "</genome>")
        .ok_or_else(|| mep_err!(Codec: "summary file missing <genome> section"))?;

    let tag_end = genome_section
        .find('>')
        .ok_or_else(|| mep_err!(Codec: "malformed <genome> tag"))?;
    let attrs = tag_attrs(&genome_section[..tag_end]);
    let rows: usize = find_attr(&attrs, "rows")
        .ok_or_else(|| mep_err!(Codec: "genome tag missing rows attribute"))?
        .parse()
        .map_err(|_| mep_err!(Codec: "genome tag has non-numeric rows attribute"))?;
    let categories: u16 = find_attr(&attrs, "categories")
        .ok_or_else(|| mep_err!(Codec: "genome tag missing categories attribute"))?
        .parse()
        .map_err(|_| mep_err!(Codec: "genome tag has non-numeric categories attribute"))?;
    let patch_length: usize = find_attr(&attrs, "patch_length")
        .ok_or_else(|| mep_err!(Codec: "genome tag missing patch_length attribute"))?
        .parse()
        .map_err(|_| mep_err!(Codec: "genome tag has non-numeric patch_length attribute"))?;
    let best_index: usize = find_attr(&attrs, "best_index")
        .ok_or_else(|| mep_err!(Codec: "genome tag missing best_index attribute"))?
        .parse()
        .map_err(|_| mep_err!(Codec: "genome tag has non-numeric best_index attribute"))?;
    let best_category: u16 = find_attr(&attrs, "best_category")
        .ok_or_else(|| mep_err!(Codec: "genome tag missing best_category attribute"))?
        .parse()
        .map_err(|_| mep_err!(Codec: "genome tag has non-numeric best_category attribute"))?;

    let mut genes = Vec::new();
    let mut cursor = tag_end;
    while let Some(rel_start) = genome_section[cursor..].find("<gene") {
        let gene_tag_start = cursor + rel_start;
        let gene_tag_end = genome_section[gene_tag_start..]
            .find('>')
            .map(|p| gene_tag_start + p)
            .ok_or_else(|| mep_err!(Codec: "unterminated <gene> tag"))?;
        let self_closing = genome_section.as_bytes()[gene_tag_end - 1] == b'/';
        let inner_end = if self_closing { gene_tag_end - 1 } else { gene_tag_end };
        let inner = &genome_section[gene_tag_start + "<gene".len()..inner_end];
        let gene_attrs = tag_attrs(inner);

        let opcode: u32 = find_attr(&gene_attrs, "opcode")
            .ok_or_else(|| mep_err!(Codec: "gene tag missing opcode attribute"))?
            .parse()
            .map_err(|_| mep_err!(Codec: "gene tag has non-numeric opcode attribute"))?;
        let param: f64 = find_attr(&gene_attrs, "param")
            .ok_or_else(|| mep_err!(Codec: "gene tag missing param attribute"))?
            .parse()
            .map_err(|_| mep_err!(Codec: "gene tag has non-numeric param attribute"))?;
        let args_attr = find_attr(&gene_attrs, "args").unwrap_or("");
        let args = if args_attr.is_empty() {
            Vec::new()
        } else {
            args_attr
                .split(',')
                .map(|a| a.parse::<usize>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| mep_err!(Codec: "gene tag has non-numeric args list"))?
        };

        genes.push(codec::GeneRecord { opcode, param, args });
        cursor = gene_tag_end + 1;
    }

    Ok(GenomeRecord {
        rows,
        categories,
        patch_length,
        best_index,
        best_category,
        genes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mep_genome::{Gene, Locus};
    use mep_ops::{Category, Primitive};
    use std::sync::atomic::{AtomicUsize, Ordering};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn temp_path() -> std::path::PathBuf {
        let id = COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut path = std::env::temp_dir();
        path.push(format!("mep-data-summary-test-{}-{id}.xml", std::process::id()));
        path
    }

    fn toy_sset() -> SymbolSet {
        let mut set = SymbolSet::new(1);
        set.insert_default(Primitive::Var {
            name: "X0",
            category: Category(0),
            index: 0,
        })
        .unwrap();
        set
    }

    #[test]
    fn write_then_read_round_trips_genome_record() {
        let sset = toy_sset();
        let opcode = sset.opcode_of("X0").unwrap();
        let genome = Genome::from_genes(vec![Gene::terminal(opcode)], 1, 1, 1, Locus::new(0, Category(0)));
        let fitness = Fitness::from(1.5);

        let summary = RunSummary {
            generations_run: 42,
            stopped: "threshold",
            best_fitness: &fitness,
            best_genome: &genome,
        };

        let path = temp_path();
        write_summary(&path, &summary).unwrap();
        let record = read_summary(&path, &sset).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(record, codec::encode(&genome));
    }
}
