//! # 命令行接口模块
//!
//! 使用 `clap` 定义了程序的命令行结构，包括子命令和参数。
//! 所有用户通过命令行与程序交互的入口点都在此模块中定义。

use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// 口令的环境变量名，避免口令出现在 shell 历史中。
pub const PASSWORD_ENV: &str = "LSB_SEAL_PASSWORD";

/// 一款带口令加密的 LSB 隐写命令行工具，在无损格式图像 (如 PNG, BMP) 中隐藏或恢复文本和文件。
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "一款带口令加密的 LSB 隐写命令行工具。数据经 AES-256-GCM 加密后写入像素通道的最低 2 位，结果总是保存为 PNG。"
)]
pub struct Cli {
    /// 输出更多日志 (-v 为 info，-vv 为 debug)。
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令：hide (隐藏)、recover (恢复) 和 capacity (容量)。
#[derive(Parser, Debug)]
pub enum Commands {
    /// 在无损格式图像中加密隐藏一段文本或一个文件。
    Hide(HideArgs),

    /// 从经过隐写的图像中恢复隐藏的数据。
    Recover(RecoverArgs),

    /// 显示图像能够隐藏的最大数据量。
    Capacity(CapacityArgs),
}

/// 'hide' 命令所需的参数。
#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("payload").required(true).args(["text", "file"])))]
pub struct HideArgs {
    /// 用于隐写的载体图像文件路径 (如 PNG, BMP)。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 要隐藏的文本内容。
    #[arg(short, long)]
    pub text: Option<String>,

    /// 要隐藏的文件路径，其扩展名会一并加密保存。
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// 结果图像的输出路径，默认为载体旁的 `doctored_<名称>.png`。
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// 开始写入的像素偏移。
    #[arg(short, long, default_value_t = 0)]
    pub offset: usize,

    /// 加密口令。
    #[arg(short, long, env = PASSWORD_ENV, hide_env_values = true)]
    pub password: String,

    /// 覆盖已存在的输出文件。
    #[arg(long)]
    pub force: bool,
}

/// 'recover' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct RecoverArgs {
    /// 已隐藏数据的图像文件路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 恢复数据的输出路径，默认为图像旁的 `recovered_<名称>.<扩展名>`。
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// 隐写时使用的像素偏移。
    #[arg(short, long, default_value_t = 0)]
    pub offset: usize,

    /// 解密口令。
    #[arg(short, long, env = PASSWORD_ENV, hide_env_values = true)]
    pub password: String,

    /// 将恢复的数据直接打印到标准输出，而不是写入文件。
    #[arg(long, conflicts_with = "output")]
    pub print: bool,

    /// 覆盖已存在的输出文件。
    #[arg(long)]
    pub force: bool,
}

/// 'capacity' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct CapacityArgs {
    /// 载体图像文件路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 开始写入的像素偏移。
    #[arg(short, long, default_value_t = 0)]
    pub offset: usize,
}
