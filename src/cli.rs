//! Interface de linha de comando do docjob baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (submit, watch)
//! e flags globais (--config, --report, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// docjob — envia lotes de documentos para processamento e acompanha o job.
#[derive(Debug, Parser)]
#[command(name = "docjob", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho do arquivo de configuração (padrão: ./docjob.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Imprime o relatório do job em JSON ao final.
    #[arg(long, global = true, default_value_t = false)]
    pub report: bool,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Envia as referências (uma por linha) como um único job e acompanha o status.
    Submit {
        /// Arquivo com uma referência por linha. Sem ele, lê da entrada padrão.
        #[arg(long, short)]
        file: Option<PathBuf>,
    },

    /// Volta a acompanhar um job já enviado.
    Watch {
        /// Identificador retornado pelo serviço na criação do job.
        job_id: String,
    },
}
