// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Idol name suggestion proxy
#[derive(Parser, Debug)]
#[command(name = "idol-name-proxy")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "Rate-limited proxy that asks Gemini for Korean idol names", long_about = None)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Optional TOML configuration file; environment variables override it
    #[arg(long, env = "CONFIG_PATH")]
    pub config: Option<PathBuf>,
}
