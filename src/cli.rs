//! Interface de linha de comando do promptbatch baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (run, plan)
//! e a flag global `--verbose`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// promptbatch — processa um diretório de arquivos `.prompt` contra o
/// Vertex AI Gemini, com limite de taxa e concorrência limitada.
#[derive(Debug, Parser)]
#[command(name = "promptbatch", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Habilita saída detalhada (configuração efetiva, região por job).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Executa o batch: um arquivo de saída por arquivo `.prompt` de entrada.
    Run(RunArgs),

    /// Simulação: mostra o que seria processado ou pulado, sem gravar nada.
    Plan(PlanArgs),
}

/// Flags do subcomando `run`. Todas são opcionais; valores ausentes vêm de
/// variáveis de ambiente, de `promptbatch.toml` ou dos defaults, nessa ordem.
#[derive(Debug, Default, Args)]
pub struct RunArgs {
    /// Diretório com os arquivos `.prompt` de entrada.
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Diretório de saída (criado se não existir).
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Identificador do modelo Gemini.
    #[arg(long)]
    pub model: Option<String>,

    /// Projeto Google Cloud.
    #[arg(long)]
    pub project: Option<String>,

    /// Máximo de jobs simultaneamente em voo.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Número máximo de tokens por resposta.
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Temperatura de amostragem.
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Intervalo mínimo entre admissões, em milissegundos.
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Requisições por minuto por região (deriva o intervalo de admissão).
    #[arg(long)]
    pub rpm: Option<u32>,

    /// Timeout por job, em segundos.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Para de admitir novos jobs após este número de falhas (0 = ilimitado).
    #[arg(long)]
    pub fail_limit: Option<u32>,

    /// Trata resposta sem conteúdo como falha em vez de saída vazia.
    #[arg(long, default_value_t = false)]
    pub fail_on_empty: bool,
}

/// Flags do subcomando `plan`.
#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Diretório com os arquivos `.prompt` de entrada.
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Diretório de saída contra o qual as decisões de skip são avaliadas.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_run_subcommand() {
        let cli = Cli::parse_from([
            "promptbatch",
            "run",
            "--input-dir",
            "prompts",
            "--output-dir",
            "out",
            "--workers",
            "16",
        ]);
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.input_dir.unwrap(), PathBuf::from("prompts"));
                assert_eq!(args.output_dir.unwrap(), PathBuf::from("out"));
                assert_eq!(args.workers, Some(16));
                assert!(args.model.is_none());
                assert!(!args.fail_on_empty);
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn cli_parses_rate_and_failure_flags() {
        let cli = Cli::parse_from([
            "promptbatch",
            "run",
            "--interval-ms",
            "250",
            "--fail-limit",
            "5",
            "--fail-on-empty",
        ]);
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.interval_ms, Some(250));
                assert_eq!(args.fail_limit, Some(5));
                assert!(args.fail_on_empty);
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn cli_parses_plan_subcommand() {
        let cli = Cli::parse_from(["promptbatch", "plan", "--input-dir", "prompts"]);
        match cli.command {
            Command::Plan(args) => {
                assert_eq!(args.input_dir.unwrap(), PathBuf::from("prompts"));
                assert!(args.output_dir.is_none());
            }
            _ => panic!("expected Plan command"),
        }
    }

    #[test]
    fn cli_parses_global_verbose() {
        let cli = Cli::parse_from(["promptbatch", "--verbose", "run"]);
        assert!(cli.verbose);
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
