//! Interface de terminal do docjob — spinner e saída colorida.
//!
//! Usa as crates `indicatif` para o spinner de progresso e `console` para
//! estilização com cores. O [`JobProgress`] renderiza cada transição do
//! orquestrador: id do job, indicador de consulta, erro e resultado final.

use std::time::Duration;

use console::{Color, Style};
use indicatif::{ProgressBar, ProgressStyle};

use crate::state_machine::{Failure, OrchestrationState, RunOutcome, RunReport};

/// Indicador visual de progresso de um job no terminal.
///
/// O spinner e as mensagens vão para stderr; apenas o resultado do job é
/// impresso em stdout.
pub struct JobProgress {
    // Spinner do indicatif.
    pb: ProgressBar,
    // Estilo verde para sucesso.
    green: Style,
    // Estilo vermelho para falhas definitivas.
    red: Style,
    // Estilo amarelo para job ainda pendente.
    yellow: Style,
    // Total de tentativas, exibido junto com a tentativa atual.
    max_attempts: u32,
}

impl JobProgress {
    /// Inicia o spinner e retorna a instância de progresso.
    pub fn start(max_attempts: u32) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow().bold(),
            max_attempts,
        }
    }

    /// Atualiza o spinner para refletir o estado atual.
    pub fn render(&self, state: &OrchestrationState) {
        if let OrchestrationState::Submitted(job_id) = state {
            self.pb.println(format!(
                "  {} Job submitted! Job ID: {job_id}",
                self.green.apply_to("✓")
            ));
        }
        self.pb.set_message(describe(state, self.max_attempts));
    }

    /// Finaliza o spinner e exibe o resultado do job.
    ///
    /// O payload de sucesso vai para stdout como JSON formatado; StillPending
    /// aparece em amarelo, falhas definitivas em vermelho.
    pub fn finish(&self, state: &OrchestrationState) {
        self.pb.finish_and_clear();
        match state {
            OrchestrationState::Completed { job_id, payload } => {
                eprintln!("  {} Job {job_id} completed", self.green.apply_to("🎉"));
                println!(
                    "{}",
                    serde_json::to_string_pretty(payload).unwrap_or_default()
                );
            }
            OrchestrationState::Failed(failure) if failure.is_still_pending() => {
                eprintln!("  {} {failure}", self.yellow.apply_to("⏳"));
            }
            OrchestrationState::Failed(failure) => {
                eprintln!("  {} {failure}", self.red.apply_to("✗"));
            }
            _ => {}
        }
    }

    /// Imprime o relatório do job formatado em JSON, com o título na cor do
    /// resultado.
    pub fn print_report(&self, report: &RunReport) {
        let style = Style::new().fg(outcome_color(&report.outcome)).bold();
        eprintln!();
        eprintln!("{}", style.apply_to("─── Job Report ───"));
        eprintln!(
            "{}",
            serde_json::to_string_pretty(report).unwrap_or_default()
        );
    }
}

// Mesmas cores de `finish`: verde, amarelo para pendente, vermelho para falha.
fn outcome_color(outcome: &RunOutcome) -> Color {
    match outcome {
        RunOutcome::Completed => Color::Green,
        RunOutcome::StillPending => Color::Yellow,
        RunOutcome::Failed(_) => Color::Red,
    }
}

/// Mensagem do spinner para cada estado.
fn describe(state: &OrchestrationState, max_attempts: u32) -> String {
    match state {
        OrchestrationState::Idle => "Idle".to_string(),
        OrchestrationState::Submitting => "Submitting...".to_string(),
        OrchestrationState::Submitted(job_id) => format!("Job {job_id} accepted"),
        OrchestrationState::Polling { job_id, attempt } => format!(
            "Checking job status for {job_id} (attempt {}/{max_attempts})...",
            attempt.ordinal + 1
        ),
        OrchestrationState::Completed { job_id, .. } => format!("Job {job_id} completed"),
        OrchestrationState::Failed(Failure::Submission(err)) => err.to_string(),
        OrchestrationState::Failed(Failure::Polling(err)) => err.to_string(),
    }
}
