// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses flags with
// `clap` and hands them to Layer 2 (application).
// Running with no flags reproduces the reference FordA run;
// --evaluate-from re-scores a saved run instead of training.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::TrainArgs;

use crate::application::{
    evaluate_use_case::{EvaluateUseCase, EvaluationReport},
    train_use_case::{RunReport, TrainUseCase},
};
use crate::ml::inferencer::Evaluation;

#[derive(Parser, Debug)]
#[command(
    name = "forda-transformer",
    version = "0.1.0",
    about = "Train a transformer classifier on the FordA time-series dataset."
)]
pub struct Cli {
    #[command(flatten)]
    pub train: TrainArgs,

    /// Skip training: score the run saved in this --artifact-dir
    /// on --test-source
    #[arg(long)]
    pub evaluate_from: Option<String>,
}

impl Cli {
    /// Dispatch to training (default) or to re-scoring a saved run.
    pub fn run(self) -> Result<()> {
        match self.evaluate_from {
            Some(dir) => Self::run_evaluate(dir, self.train),
            None      => Self::run_train(self.train),
        }
    }

    fn run_train(args: TrainArgs) -> Result<()> {
        tracing::info!(
            "Starting training: train='{}' test='{}'",
            args.train_source,
            args.test_source
        );

        let report = TrainUseCase::new(args.into()).execute()?;
        print_report(&report);
        Ok(())
    }

    fn run_evaluate(dir: String, args: TrainArgs) -> Result<()> {
        tracing::info!("Evaluating saved run '{}' on '{}'", dir, args.test_source);

        let use_case = EvaluateUseCase::new(
            dir,
            args.test_source,
            args.predict_count,
            args.backend.into(),
        );
        let report: EvaluationReport = use_case.execute()?;

        println!("x_test shape:  {:?}", report.test_shape);
        print_predictions(&report.predictions);
        print_evaluation(&report.evaluation);
        Ok(())
    }
}

// ─── Output ──────────────────────────────────────────────────────────────────

fn print_report(report: &RunReport) {
    println!("x_train shape: {:?}", report.train_shape);
    println!("x_test shape:  {:?}", report.test_shape);

    for m in &report.history {
        match (m.val_loss, m.val_acc) {
            (Some(vl), Some(va)) => println!(
                "Epoch {:>3} | loss {:.4} | acc {:.4} | val_loss {:.4} | val_acc {:.4}",
                m.epoch, m.train_loss, m.train_acc, vl, va
            ),
            _ => println!(
                "Epoch {:>3} | loss {:.4} | acc {:.4}",
                m.epoch, m.train_loss, m.train_acc
            ),
        }
    }
    match (report.stopped_epoch, report.restored_epoch()) {
        (Some(stop), Some(best)) => {
            println!("Early stopping triggered at epoch {stop}; restored weights from epoch {best}.")
        }
        (Some(stop), None) => {
            println!("Early stopping triggered at epoch {stop}; no epoch improved, keeping last weights.")
        }
        _ => {}
    }

    print_predictions(&report.predictions);
    print_evaluation(&report.evaluation);
}

fn print_predictions(predictions: &[Vec<f32>]) {
    println!("\nPredictions (class probabilities):");
    for (i, probs) in predictions.iter().enumerate() {
        let formatted: Vec<String> = probs.iter().map(|p| format!("{p:.4}")).collect();
        println!("  sample {i}: [{}]", formatted.join(", "));
    }
}

fn print_evaluation(evaluation: &Evaluation) {
    println!(
        "\nTest loss: {:.4} - Test accuracy: {:.4} ({} samples)",
        evaluation.loss, evaluation.accuracy, evaluation.samples
    );
}
