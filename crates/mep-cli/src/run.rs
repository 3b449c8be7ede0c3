//! The CLI's end-to-end driver: load a dataset, resolve a run configuration, drive the engine
//! for `--runs` repetitions, wrap the best genome in a lambda, optionally persist run artifacts,
//! and print a one-line report. Kept as a free function over [`crate::cli::Cli`] rather than a
//! struct, since a run has no state that outlives one invocation.
use std::path::Path;

use mep_error::{MepResult, mep_err};
use mep_eval::{Dataset, Evaluator, EvaluatorKind, Example};
use mep_evolve::{AlpsStrategy, Config, Engine, Summary};
use mep_lambda::{BinaryLambda, DynSlotLambda, GaussianLambda, RegressionLambda};
use mep_ops::{Category, SymbolSet};

use crate::cli::Cli;

pub fn run(cli: &Cli) -> MepResult<()> {
    if let Some(symbols) = &cli.symbols {
        tracing::warn!(
            path = %symbols.display(),
            "custom primitive files are not supported in this build; falling back to the built-in library"
        );
    }

    let loaded = load_dataset(&cli.dataset)?;
    let is_classification = loaded.dataset.class_count().is_some();
    tracing::info!(
        examples = loaded.dataset.len(),
        features = loaded.dataset.feature_count(),
        classification = is_classification,
        "dataset loaded"
    );

    let (train, validation) = split_validation(loaded.dataset, cli.validation);

    let testset = cli
        .testset
        .as_ref()
        .map(|path| load_dataset(path))
        .transpose()?
        .map(|l| l.dataset);
    let holdout = testset.or(validation);

    let sset = build_symbol_set(train.feature_count(), is_classification)?;
    if !sset.enough_terminals() {
        return Err(mep_err!(InvalidConfig: "symbol set has no terminal for a reachable category"));
    }

    let evaluator_kind = parse_evaluator(cli.evaluator.as_deref(), is_classification)?;
    let evaluator = Evaluator::new(evaluator_kind);

    if let Some(seed) = cli.random_seed {
        mep_core::random_provider::set_seed(seed);
    }

    let (threshold_fitness, threshold_accuracy) = parse_threshold(cli.threshold.as_deref())?;
    let output_category = Category(0);

    let mut best_summary: Option<Summary> = None;
    let runs = cli.runs.unwrap_or(1).max(1);
    for attempt in 1..=runs {
        let config = build_config(cli, threshold_fitness, threshold_accuracy);
        let strategy = AlpsStrategy::new();
        let mut engine = Engine::new(&sset, &train, Evaluator::new(evaluator_kind), resolve_config(&config, &train, is_classification), &strategy, output_category)?;
        let mut strategy = AlpsStrategy::new();
        let summary = engine.run(&mut strategy)?;

        tracing::info!(
            attempt,
            runs,
            generations_run = summary.generations_run,
            stopped = ?summary.stopped,
            fitness = summary.best.fitness.as_ref().map(mep_core::Fitness::as_f32).unwrap_or(f32::NEG_INFINITY) as f64,
            "run finished"
        );

        if cli.arl == Some(true) {
            log_arl_candidates(&summary, &sset, &evaluator, &train, cli.stat_dir.as_deref(), cli.stat_arl);
        }

        let is_better = match &best_summary {
            None => true,
            Some(b) => {
                summary.best.fitness.as_ref().map(mep_core::Fitness::as_f32).unwrap_or(f32::NEG_INFINITY)
                    > b.best.fitness.as_ref().map(mep_core::Fitness::as_f32).unwrap_or(f32::NEG_INFINITY)
            }
        };
        if is_better {
            best_summary = Some(summary);
        }
    }

    let summary = best_summary.expect("runs is always at least 1");
    let best_genome = summary.best.genome.clone();
    let best_fitness = summary.best.fitness.clone().unwrap_or_else(|| mep_core::Fitness::penalty(1));

    report_model(&best_genome, &sset, evaluator_kind, &train, holdout.as_ref(), &evaluator);

    if cli.stat_summary {
        if let Some(dir) = &cli.stat_dir {
            std::fs::create_dir_all(dir)?;
            let path = dir.join("summary.xml");
            let stopped = match summary.stopped {
                mep_evolve::StopReason::GenerationsReached => "generations",
                mep_evolve::StopReason::ThresholdMet => "threshold",
                mep_evolve::StopReason::Stuck => "stuck",
            };
            mep_data::write_summary(
                &path,
                &mep_data::RunSummary {
                    generations_run: summary.generations_run as usize,
                    stopped,
                    best_fitness: &best_fitness,
                    best_genome: &best_genome,
                },
            )?;
            tracing::info!(path = %path.display(), "run summary written");
        } else {
            tracing::warn!("--stat-summary was given without --stat-dir; skipping");
        }
    }

    println!(
        "generations={} stopped={:?} fitness={:.6}",
        summary.generations_run,
        summary.stopped,
        best_fitness.as_f32()
    );

    Ok(())
}

fn load_dataset(path: &Path) -> MepResult<mep_data::LoadedDataset> {
    let is_xrff = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xrff"));
    if is_xrff {
        mep_data::read_xrff(path)
    } else {
        mep_data::read_csv(path, &mep_data::CsvOptions::default())
    }
}

fn split_validation(dataset: Dataset, validation_percent: Option<f32>) -> (Dataset, Option<Dataset>) {
    let Some(percent) = validation_percent else {
        return (dataset, None);
    };
    let fraction = (percent / 100.0).clamp(0.0, 0.9);
    let class_count = dataset.class_count();
    let mut examples: Vec<Example> = dataset.examples().to_vec();
    let split_at = ((examples.len() as f32) * (1.0 - fraction)).round() as usize;
    let split_at = split_at.clamp(1, examples.len().saturating_sub(1).max(1));
    let held_out = examples.split_off(split_at);

    let train = match class_count {
        Some(n) => Dataset::classification(examples, n),
        None => Dataset::regression(examples),
    };
    let validation = if held_out.is_empty() {
        None
    } else {
        Some(match class_count {
            Some(n) => Dataset::classification(held_out, n),
            None => Dataset::regression(held_out),
        })
    };
    (train, validation)
}

fn build_symbol_set(feature_count: usize, is_classification: bool) -> MepResult<SymbolSet> {
    let mut set = SymbolSet::new(1);
    let category = Category(0);
    mep_ops::stdlib::install_variables(&mut set, category, feature_count)?;
    mep_ops::stdlib::install_arithmetic(&mut set, category)?;
    if is_classification {
        mep_ops::stdlib::install_comparison(&mut set, category, category)?;
    }
    Ok(set)
}

fn parse_evaluator(spec: Option<&str>, is_classification: bool) -> MepResult<EvaluatorKind> {
    let Some(spec) = spec else {
        return Ok(if is_classification {
            EvaluatorKind::DynamicSlot { x_slot: 4 }
        } else {
            EvaluatorKind::MeanAbsoluteError
        });
    };
    let (name, arg) = match spec.split_once(':') {
        Some((n, a)) => (n, Some(a)),
        None => (spec, None),
    };
    match name {
        "count" => Ok(EvaluatorKind::CountMatch),
        "mae" => Ok(EvaluatorKind::MeanAbsoluteError),
        "rmae" => Ok(EvaluatorKind::RelativeMeanAbsoluteError),
        "mse" => Ok(EvaluatorKind::MeanSquaredError),
        "binary" => Ok(EvaluatorKind::Binary),
        "gaussian" => Ok(EvaluatorKind::Gaussian),
        "dynslot" => {
            let x_slot = arg
                .map(|a| a.parse::<usize>())
                .transpose()
                .map_err(|_| mep_err!(InvalidConfig: "dynslot evaluator argument must be an integer x-slot count"))?
                .unwrap_or(4);
            Ok(EvaluatorKind::DynamicSlot { x_slot })
        }
        other => Err(mep_err!(InvalidConfig: "unknown evaluator {other:?}")),
    }
}

/// `<value>[%]` (§6): a trailing `%` means an accuracy threshold, otherwise a raw fitness value.
fn parse_threshold(spec: Option<&str>) -> MepResult<(Option<f32>, Option<f32>)> {
    let Some(spec) = spec else {
        return Ok((None, None));
    };
    if let Some(pct) = spec.strip_suffix('%') {
        let value: f32 = pct
            .trim()
            .parse()
            .map_err(|_| mep_err!(InvalidConfig: "threshold {spec:?} is not a valid percentage"))?;
        Ok((None, Some((value / 100.0).clamp(0.0, 1.0))))
    } else {
        let value: f32 = spec
            .trim()
            .parse()
            .map_err(|_| mep_err!(InvalidConfig: "threshold {spec:?} is not a valid fitness value"))?;
        Ok((Some(value), None))
    }
}

fn build_config(cli: &Cli, threshold_fitness: Option<f32>, threshold_accuracy: Option<f32>) -> Config {
    let mut config = Config::default();
    config.code_length = cli.code_length;
    config.layers = cli.layers;
    config.individuals_per_layer = cli.population_size;
    config.dss = cli.dss;
    if let Some(p) = cli.mutation_rate {
        config.mutation_rate = p;
    }
    if let Some(p) = cli.crossover_rate {
        config.crossover_rate = p;
    }
    config.tournament_size = cli.tournament_size;
    if let Some(n) = cli.brood {
        config.brood_recombination = n;
    }
    if let Some(n) = cli.generations {
        config.generations = n;
    }
    if let Some(n) = cli.gwi {
        config.max_stuck_time = n;
    }
    config.mate_zone = cli.mate_zone;
    if let Some(b) = cli.elitism {
        config.elitism = b;
    }
    if let Some(b) = cli.arl {
        config.arl = b;
    }
    if let Some(bits) = cli.cache {
        config.cache_bits = bits;
    }
    config.threshold_fitness = threshold_fitness;
    config.threshold_accuracy = threshold_accuracy;
    config.runs = 1;
    config
}

fn resolve_config(config: &Config, dataset: &Dataset, is_classification: bool) -> mep_evolve::ResolvedConfig {
    mep_evolve::tune::resolve(config, dataset.len(), is_classification)
}

fn report_model(
    genome: &mep_genome::Genome,
    sset: &SymbolSet,
    kind: EvaluatorKind,
    train: &Dataset,
    holdout: Option<&Dataset>,
    evaluator: &Evaluator,
) {
    let train_accuracy = evaluator.accuracy(genome, sset, train) as f64;
    tracing::info!(train_accuracy, "training accuracy");
    if let Some(holdout) = holdout {
        let holdout_accuracy = evaluator.accuracy(genome, sset, holdout) as f64;
        tracing::info!(holdout_accuracy, "held-out accuracy");
    }

    match kind {
        EvaluatorKind::DynamicSlot { x_slot } => {
            if let Ok(model) = DynSlotLambda::fit(genome.clone(), sset, train, x_slot) {
                tracing::info!(training_accuracy = model.training_accuracy(sset, train), "dynamic-slot model fitted");
            }
        }
        EvaluatorKind::Gaussian => {
            if let Ok(model) = GaussianLambda::fit(genome.clone(), sset, train) {
                let _ = model;
                tracing::info!("gaussian model fitted");
            }
        }
        EvaluatorKind::Binary => {
            let _ = BinaryLambda::new(genome.clone());
            tracing::info!("binary model built");
        }
        _ => {
            let _ = RegressionLambda::new(genome.clone());
            tracing::info!("regression model built");
        }
    }
}

fn log_arl_candidates(
    summary: &Summary,
    sset: &SymbolSet,
    evaluator: &Evaluator,
    dataset: &Dataset,
    stat_dir: Option<&Path>,
    write_file: bool,
) {
    let baseline = summary.best.fitness.as_ref().map(mep_core::Fitness::as_f32).unwrap_or(f32::NEG_INFINITY);
    if !baseline.is_finite() {
        return;
    }
    let candidates = mep_alters::useful_blocks(&summary.best.genome, sset, baseline, 0.10, |candidate| {
        Ok(evaluator.evaluate(candidate, sset, dataset).as_f32())
    });
    let Ok(candidates) = candidates else {
        return;
    };
    for candidate in &candidates {
        tracing::info!(
            locus = candidate.locus.index,
            relative_loss = candidate.relative_loss as f64,
            "arl candidate block"
        );
    }
    if write_file {
        if let Some(dir) = stat_dir {
            if let Err(err) = write_arl_report(dir, &candidates) {
                tracing::warn!(%err, "could not write --stat-arl report");
            }
        } else {
            tracing::warn!("--stat-arl was given without --stat-dir; logging only");
        }
    }
}

fn write_arl_report(dir: &Path, candidates: &[mep_alters::ArlCandidate]) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let mut report = String::new();
    for candidate in candidates {
        report.push_str(&format!("locus={} relative_loss={:.4}\n", candidate.locus.index, candidate.relative_loss));
    }
    std::fs::write(dir.join("arl.log"), report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_evaluator_is_dynslot_for_classification_and_mae_otherwise() {
        assert_eq!(parse_evaluator(None, true).unwrap(), EvaluatorKind::DynamicSlot { x_slot: 4 });
        assert_eq!(parse_evaluator(None, false).unwrap(), EvaluatorKind::MeanAbsoluteError);
    }

    #[test]
    fn evaluator_string_parses_named_kinds_and_dynslot_argument() {
        assert_eq!(parse_evaluator(Some("mse"), false).unwrap(), EvaluatorKind::MeanSquaredError);
        assert_eq!(parse_evaluator(Some("rmae"), false).unwrap(), EvaluatorKind::RelativeMeanAbsoluteError);
        assert_eq!(parse_evaluator(Some("gaussian"), true).unwrap(), EvaluatorKind::Gaussian);
        assert_eq!(
            parse_evaluator(Some("dynslot:6"), true).unwrap(),
            EvaluatorKind::DynamicSlot { x_slot: 6 }
        );
    }

    #[test]
    fn unknown_evaluator_name_is_an_error() {
        assert!(parse_evaluator(Some("quadratic"), false).is_err());
    }

    #[test]
    fn threshold_with_percent_suffix_parses_as_accuracy() {
        let (fitness, accuracy) = parse_threshold(Some("95%")).unwrap();
        assert_eq!(fitness, None);
        assert!((accuracy.unwrap() - 0.95).abs() < 1e-6);
    }

    #[test]
    fn threshold_without_suffix_parses_as_raw_fitness() {
        let (fitness, accuracy) = parse_threshold(Some("-0.01")).unwrap();
        assert_eq!(accuracy, None);
        assert!((fitness.unwrap() - (-0.01)).abs() < 1e-6);
    }

    #[test]
    fn no_threshold_leaves_both_unset() {
        assert_eq!(parse_threshold(None).unwrap(), (None, None));
    }

    #[test]
    fn symbol_set_for_classification_includes_comparison_primitives() {
        let set = build_symbol_set(3, true).unwrap();
        assert!(set.enough_terminals());
        assert!(set.opcode_of("gt").is_some());
    }

    #[test]
    fn symbol_set_for_regression_omits_comparison_primitives() {
        let set = build_symbol_set(2, false).unwrap();
        assert!(set.enough_terminals());
        assert!(set.opcode_of("gt").is_none());
    }

    #[test]
    fn validation_split_preserves_total_example_count() {
        let examples: Vec<Example> = (0..20)
            .map(|i| Example::new(vec![mep_ops::Value::Double(i as f64)], mep_ops::Value::Double(i as f64)))
            .collect();
        let dataset = Dataset::regression(examples);
        let total = dataset.len();
        let (train, validation) = split_validation(dataset, Some(25.0));
        let held_out = validation.map(|v| v.len()).unwrap_or(0);
        assert_eq!(train.len() + held_out, total);
        assert!(held_out > 0);
    }
}

