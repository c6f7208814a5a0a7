//! Interface de terminal do promptbatch — barra de progresso e saída colorida.
//!
//! Usa as crates `indicatif` para a barra de progresso do batch e `console`
//! para estilização com cores. [`BatchProgress`] é a camada de apresentação
//! sobre os resultados estruturados do despachante: o motor nunca formata
//! texto diretamente.

use std::path::Path;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::dispatch::BatchOutcome;
use crate::error::JobFailure;

/// Indicador visual de progresso de um batch no terminal.
///
/// Linhas de progresso (admissão, conclusão, skips) são impressas acima da
/// barra via `println`; sucesso em verde, falha em vermelho, avisos em
/// amarelo. Clonável e compartilhável entre tarefas.
#[derive(Clone)]
pub struct BatchProgress {
    // Barra de progresso do indicatif (thread-safe, clonável).
    bar: ProgressBar,
    // Estilo verde para conclusões.
    green: Style,
    // Estilo vermelho para falhas.
    red: Style,
    // Estilo amarelo para avisos.
    yellow: Style,
}

impl BatchProgress {
    /// Cria a barra para um batch com `total` unidades.
    pub fn start(total: u64) -> Self {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{bar:40.cyan/blue} {pos}/{len} {msg}")
                .expect("invalid template"),
        );
        Self::with_bar(bar)
    }

    /// Barra invisível, para testes e para o subcomando `plan`.
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        Self {
            bar,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Linha de admissão: posição, carimbo de hora, alvo e região.
    pub fn admitted(&self, index: usize, total: usize, target: &Path, region: &str) {
        self.bar.println(format!(
            "{index}/{total} {} Processing: {} ({region})",
            now_stamp(),
            target.display()
        ));
    }

    /// A saída já existe; a unidade foi pulada.
    pub fn skip_done(&self, target: &Path) {
        self.bar
            .println(format!("File {} already exists. Skipping.", target.display()));
        self.bar.inc(1);
    }

    /// Outra unidade deste batch já reivindicou o mesmo alvo.
    pub fn skip_duplicate(&self, target: &Path) {
        self.bar.println(format!(
            "File {} already claimed. Skipping.",
            target.display()
        ));
        self.bar.inc(1);
    }

    /// Falha ao ler o arquivo de entrada (a unidade não chega a ser admitida).
    pub fn read_failed(&self, input: &Path, err: &std::io::Error) {
        self.bar.println(format!(
            "{}",
            self.red
                .apply_to(format!("Error reading {}: {err}", input.display()))
        ));
        self.bar.inc(1);
    }

    /// Job concluído com sucesso.
    pub fn job_done(&self, index: usize, bytes_written: usize) {
        self.bar.println(format!(
            "{}",
            self.green.apply_to(format!(
                "{} Job {index} done ({bytes_written} bytes)",
                now_stamp()
            ))
        ));
        self.bar.inc(1);
    }

    /// Job falhou; a falha é contada, não retentada.
    pub fn job_failed(&self, index: usize, target: &Path, failure: &JobFailure) {
        self.bar.println(format!(
            "{}",
            self.red.apply_to(format!(
                "{} Job {index} failed ({}): {failure}",
                now_stamp(),
                target.display()
            ))
        ));
        self.bar.inc(1);
    }

    /// Aviso não-fatal do provedor (prompt bloqueado, término antecipado).
    pub fn job_warning(&self, index: usize, warning: &str) {
        self.bar.println(format!(
            "{}",
            self.yellow.apply_to(format!("Job {index}: {warning}"))
        ));
    }

    /// O orçamento de falhas foi atingido; novas admissões param.
    pub fn budget_exhausted(&self, failed: usize) {
        self.bar.println(format!(
            "{}",
            self.red.apply_to(format!(
                "Failure limit reached ({failed} failures). No new jobs will be admitted."
            ))
        ));
    }

    /// Sinal de interrupção recebido; novas admissões param.
    pub fn interrupted(&self) {
        self.bar.println(format!(
            "{}",
            self.yellow
                .apply_to("Interrupted. Waiting for in-flight jobs...")
        ));
    }

    /// Resumo final e marcador de conclusão do batch.
    pub fn finish(&self, outcome: &BatchOutcome) {
        self.bar.finish_and_clear();
        let summary = format!(
            "{} completed, {} failed, {} skipped ({} done, {} duplicate), {} total",
            outcome.completed,
            outcome.failed,
            outcome.skipped(),
            outcome.skipped_done,
            outcome.skipped_duplicate,
            outcome.total
        );
        if outcome.is_clean() {
            println!("{}", self.green.apply_to(summary));
        } else {
            println!("{}", self.red.apply_to(summary));
        }
        println!("Processing complete.");
    }
}

// Carimbo de hora local no formato das linhas de progresso.
fn now_stamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
