//! # 命令处理逻辑模块
//!
//! 包含处理 `hide`、`recover` 和 `capacity` 子命令的高级业务逻辑。
//! 本模块负责协调文件 I/O、调用隐写核心函数以及向用户报告结果。

use crate::cli::{CapacityArgs, HideArgs, RecoverArgs};
use crate::constants::{
    DEFAULT_TEXT_EXTENSION, HIDDEN_IMAGE_PREFIX, MAX_EXTENSION_LEN, MIN_PASSWORD_LEN,
    RECOVERED_FILE_PREFIX,
};
use crate::envelope::{capacity, embed, extract, max_payload_len};
use anyhow::{Context, Result};
use colored::Colorize;
use image::{DynamicImage, ImageFormat};
use log::{info, warn};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// 处理 'Hide' 命令的执行逻辑。
///
/// 负责读取载体图像和待隐藏的数据、检查隐写空间是否足够、加密并写入像素，
/// 最后将结果以 PNG 格式写入目标图像文件。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径、偏移和口令的 `HideArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 口令过短。
/// * 无法读取输入的图像或数据文件。
/// * 目标文件已存在且未指定 `--force`。
/// * 图像没有足够的空间来隐藏数据。
/// * 无法写入到目标图像文件。
pub fn handle_hide(args: HideArgs) -> Result<()> {
    check_password(&args.password)?;

    let image = open_image(&args.image)?;

    let (payload, extension) = match (&args.text, &args.file) {
        (Some(text), _) => {
            anyhow::ensure!(!text.is_empty(), "No text to hide: --text is empty.");
            (text.as_bytes().to_vec(), String::new())
        }
        (None, Some(file)) => {
            let data = fs::read(file).with_context(|| {
                format!(
                    "Unable to read data file: {}",
                    file.to_string_lossy().red().bold()
                )
            })?;
            // 与其它实现保持一致，扩展名带前导点保存，例如 `.csv`。
            let extension = file
                .extension()
                .map(|ext| format!(".{}", ext.to_string_lossy()))
                .unwrap_or_default();
            (data, extension)
        }
        (None, None) => anyhow::bail!("Either --text or --file must be provided."),
    };

    anyhow::ensure!(
        extension.len() <= MAX_EXTENSION_LEN,
        "File extension is too long: {} bytes (max {})",
        extension.len().to_string().red().bold(),
        MAX_EXTENSION_LEN
    );

    let dest = args
        .dest
        .clone()
        .unwrap_or_else(|| default_hidden_path(&args.image));
    ensure_writable(&dest, args.force)?;

    let available_space = max_payload_len(&image, &extension, args.offset);
    anyhow::ensure!(
        payload.len() <= available_space,
        "Not enough space in the image to hide the data. \nRequired: {}, Available: {}",
        format_bytes(payload.len()).red().bold(),
        format_bytes(available_space).green().bold()
    );

    let hidden = embed(&image, &payload, &extension, args.offset, &args.password)
        .with_context(|| {
            format!(
                "Failed to hide the data in {}",
                args.image.to_string_lossy().red().bold()
            )
        })?;

    if !is_png_path(&dest) {
        warn!(
            "{} does not end in .png, the image is still encoded as PNG",
            dest.display()
        );
    }

    hidden
        .save_with_format(&dest, ImageFormat::Png)
        .with_context(|| {
            format!(
                "Unable to write to target image file: {}",
                dest.to_string_lossy().red().bold()
            )
        })?;

    println!(
        "The data has been successfully hidden and saved: {}",
        dest.to_string_lossy().green().bold()
    );

    Ok(())
}

/// 处理 'Recover' 命令的执行逻辑。
///
/// 负责读取经过隐写的图像文件、解密隐藏的数据，
/// 然后写入目标文件或直接打印到标准输出。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 口令过短。
/// * 无法读取输入的图像文件。
/// * 图像中没有隐藏数据，或口令错误。
/// * 目标文件已存在且未指定 `--force`。
/// * 无法写入到目标文件。
pub fn handle_recover(args: RecoverArgs) -> Result<()> {
    check_password(&args.password)?;

    let image = open_image(&args.image)?;

    let recovered = extract(&image, args.offset, &args.password).with_context(|| {
        format!(
            "Failed to recover data from '{}'.",
            args.image.to_string_lossy().red().bold()
        )
    })?;
    info!(
        "recovered {} bytes with extension {:?}",
        recovered.data.len(),
        recovered.extension
    );

    if args.print {
        print_payload(io::stdout().lock(), &recovered.data)?;
        return Ok(());
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_recovered_path(&args.image, &recovered.extension));
    ensure_writable(&output, args.force)?;

    fs::write(&output, &recovered.data).with_context(|| {
        format!(
            "Unable to write to target file: {}",
            output.to_string_lossy().red().bold()
        )
    })?;

    println!(
        "The data has been successfully recovered and saved: {}",
        output.to_string_lossy().green().bold()
    );
    Ok(())
}

/// 处理 'Capacity' 命令的执行逻辑，报告载体的像素数和最大可隐藏数据量。
pub fn handle_capacity(args: CapacityArgs) -> Result<()> {
    let image = open_image(&args.image)?;

    println!("{}", capacity_summary(&image, args.offset));
    Ok(())
}

/// 载体容量的报告文本：像素数以及在 `offset` 之后可隐藏的文本大小。
pub fn capacity_summary(image: &DynamicImage, offset: usize) -> String {
    format!(
        "Pixels: {}, usable for hidden text: {}",
        capacity(image).to_string().green().bold(),
        format_bytes(max_payload_len(image, "", offset))
            .green()
            .bold()
    )
}

/// 以 1024 为进制格式化字节数，保留两位小数，例如 `1.50 KB`。
pub fn format_bytes(size: usize) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let mut value = size as f64;
    let mut unit = 0;
    while value > 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

/// 隐写结果的默认路径：载体旁的 `doctored_<名称>.png`。
pub fn default_hidden_path(image: &Path) -> PathBuf {
    sibling(image, &format!("{HIDDEN_IMAGE_PREFIX}{}.png", file_stem(image)))
}

/// 恢复数据的默认路径：图像旁的 `recovered_<名称>.<扩展名>`。
///
/// 扩展名来自隐藏的数据，只接受字母、数字、`-` 和 `_`，否则使用 `txt`。
pub fn default_recovered_path(image: &Path, extension: &str) -> PathBuf {
    let extension = extension.trim_start_matches('.');
    let extension = if !extension.is_empty()
        && extension
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        extension
    } else {
        DEFAULT_TEXT_EXTENSION
    };

    sibling(
        image,
        &format!("{RECOVERED_FILE_PREFIX}{}.{extension}", file_stem(image)),
    )
}

/// 输出路径是否以 `.png` 结尾 (不区分大小写)。
pub fn is_png_path(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
}

fn print_payload(mut out: impl Write, data: &[u8]) -> io::Result<()> {
    out.write_all(data)?;
    out.flush()
}

fn sibling(path: &Path, name: &str) -> PathBuf {
    path.parent().unwrap_or_else(|| Path::new("")).join(name)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string())
}

fn check_password(password: &str) -> Result<()> {
    anyhow::ensure!(
        password.chars().count() >= MIN_PASSWORD_LEN,
        "Password too short: at least {} characters are required.",
        MIN_PASSWORD_LEN.to_string().red().bold()
    );
    Ok(())
}

fn ensure_writable(path: &Path, force: bool) -> Result<()> {
    anyhow::ensure!(
        force || !path.exists(),
        "Output file already exists: {} \nUse --force to overwrite it.",
        path.to_string_lossy().red().bold()
    );
    Ok(())
}

fn open_image(path: &Path) -> Result<DynamicImage> {
    let image = image::open(path).with_context(|| {
        format!(
            "Unable to read image file: {}",
            path.to_string_lossy().red().bold()
        )
    })?;
    info!(
        "loaded {} ({}x{}, {:?})",
        path.display(),
        image.width(),
        image.height(),
        image.color()
    );
    Ok(image)
}
