use std::io::Write;

use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;

use lsb_seal::{
    cli::{Cli, Commands},
    handler::{handle_capacity, handle_hide, handle_recover},
};

/// 根据 `-v` 的次数初始化日志，设置了 `RUST_LOG` 时以环境变量为准。
fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    Builder::new()
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// 程序的主入口点
///
/// 负责解析命令行参数，并根据指定的子命令（`hide`、`recover` 或 `capacity`）
/// 将执行分派到相应的处理函数
fn main() -> anyhow::Result<()> {
    // 解析命令行参数
    let cli = Cli::parse();
    init_logger(cli.verbose);

    // 根据子命令调用相应的处理函数
    match cli.command {
        Commands::Hide(args) => handle_hide(args),
        Commands::Recover(args) => handle_recover(args),
        Commands::Capacity(args) => handle_capacity(args),
    }
}
