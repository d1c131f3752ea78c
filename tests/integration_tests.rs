use image::{DynamicImage, ImageBuffer, Rgba};
use lsb_seal::{
    StegoError,
    cli::{CapacityArgs, HideArgs, RecoverArgs},
    embed, extract,
    handler::{handle_capacity, handle_hide, handle_recover},
};
use rand::RngCore;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const PASSWORD: &str = "correct horse";

/// 一个辅助函数，用于创建一个带有随机像素的测试图像
fn create_test_image(path: &Path, width: u32, height: u32) {
    let mut img_buf = ImageBuffer::new(width, height);
    let mut raw_pixels = vec![0u8; (width * height * 4) as usize];
    rand::rng().fill_bytes(&mut raw_pixels);

    img_buf
        .pixels_mut()
        .zip(raw_pixels.chunks_exact(4))
        .for_each(|(pixel, chunk)| {
            *pixel = Rgba([chunk[0], chunk[1], chunk[2], 255]);
        });

    img_buf.save(path).expect("Failed to create test image.");
}

fn hide_text(image: &Path, text: &str, dest: Option<PathBuf>) -> HideArgs {
    HideArgs {
        image: image.to_path_buf(),
        text: Some(text.to_string()),
        file: None,
        dest,
        offset: 0,
        password: PASSWORD.to_string(),
        force: false,
    }
}

fn recover_to(image: &Path, output: Option<PathBuf>) -> RecoverArgs {
    RecoverArgs {
        image: image.to_path_buf(),
        output,
        offset: 0,
        password: PASSWORD.to_string(),
        print: false,
        force: false,
    }
}

/// 验证从隐藏到恢复的完整流程
#[test]
fn test_handle_hide_and_recover_integration() -> anyhow::Result<()> {
    // 1. 准备环境
    let dir = tempdir()?;
    let original_image_path = dir.path().join("original.png");
    let hidden_image_path = dir.path().join("hidden.png");
    let recovered_text_path = dir.path().join("recovered.txt");

    create_test_image(&original_image_path, 100, 100);
    let original_text = "This is a test message for the handler! 这是一个给处理器的测试信息！";

    // 2. 测试 handle_hide
    handle_hide(hide_text(
        &original_image_path,
        original_text,
        Some(hidden_image_path.clone()),
    ))?;
    assert!(
        hidden_image_path.exists(),
        "Hidden image should be created."
    );

    // 3. 测试 handle_recover
    handle_recover(recover_to(
        &hidden_image_path,
        Some(recovered_text_path.clone()),
    ))?;
    assert!(
        recovered_text_path.exists(),
        "Recovered text file should be created."
    );

    // 4. 验证结果
    let recovered_text = fs::read_to_string(&recovered_text_path)?;
    assert_eq!(
        original_text, recovered_text,
        "Recovered text must match the original."
    );

    Ok(())
}

/// 验证隐藏文件时扩展名随数据一起恢复，并用于默认输出路径
#[test]
fn test_hide_file_restores_extension() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("carrier.png");
    let secret_path = dir.path().join("notes.csv");

    create_test_image(&image_path, 64, 64);
    let contents = b"id,name\n1,alice\n2,bob\n";
    fs::write(&secret_path, contents)?;

    let hide_args = HideArgs {
        image: image_path.clone(),
        text: None,
        file: Some(secret_path),
        dest: None,
        offset: 128,
        password: PASSWORD.to_string(),
        force: false,
    };
    handle_hide(hide_args)?;

    let hidden_path = dir.path().join("doctored_carrier.png");
    let stored = extract(&image::open(&hidden_path)?, 128, PASSWORD)?;
    assert_eq!(stored.extension, ".csv", "Extension is stored with its leading dot.");

    let recover_args = RecoverArgs {
        offset: 128,
        ..recover_to(&hidden_path, None)
    };
    handle_recover(recover_args)?;

    let recovered_path = dir.path().join("recovered_doctored_carrier.csv");
    assert!(
        recovered_path.exists(),
        "Recovered file should keep its extension: {:?}",
        recovered_path
    );
    assert_eq!(fs::read(&recovered_path)?, contents);

    Ok(())
}

/// 验证当用户不提供输出路径时，是否能正确生成默认路径并完成操作
#[test]
fn test_handle_hide_and_recover_with_defaults() -> anyhow::Result<()> {
    // 1. 准备环境
    let dir = tempdir()?;
    let original_image_path = dir.path().join("original.png");

    create_test_image(&original_image_path, 100, 100);
    let original_text = "Testing default path generation. 测试默认路径生成。";

    // 2. 测试 handle_hide，不提供 dest 路径
    handle_hide(hide_text(&original_image_path, original_text, None))?;

    // 验证默认的隐藏图像文件是否已创建
    let expected_hidden_path = dir.path().join("doctored_original.png");
    assert!(
        expected_hidden_path.exists(),
        "Default hidden image should be created at: {:?}",
        expected_hidden_path
    );

    // 3. 测试 handle_recover，不提供输出路径
    handle_recover(recover_to(&expected_hidden_path, None))?;

    // 验证默认的恢复文本文件是否已创建
    let expected_recovered_path = dir.path().join("recovered_doctored_original.txt");
    assert!(
        expected_recovered_path.exists(),
        "Default recovered text file should be created at: {:?}",
        expected_recovered_path
    );

    // 4. 验证结果
    let recovered_text = fs::read_to_string(&expected_recovered_path)?;
    assert_eq!(
        original_text, recovered_text,
        "Recovered text from default file must match the original."
    );

    Ok(())
}

/// 验证覆盖保护机制以及 `--force` 标志是否按预期工作
#[test]
fn test_overwrite_protection_and_force_flag() -> anyhow::Result<()> {
    // 1. 准备环境
    let dir = tempdir()?;
    let image_path = dir.path().join("image.png");
    let dest_path = dir.path().join("dest.png");

    create_test_image(&image_path, 50, 50);

    // 2. 场景一：测试覆盖保护
    // 先创建一个同名的目标文件，模拟“文件已存在”的场景
    fs::write(&dest_path, "this is a dummy file to be overwritten")?;
    assert!(dest_path.exists());

    let result = handle_hide(hide_text(&image_path, "some text", Some(dest_path.clone())));
    assert!(
        result.is_err(),
        "Execution should fail without --force when file exists."
    );
    if let Err(e) = result {
        assert!(e.to_string().contains("Output file already exists"));
    }

    // 3. 场景二：测试强制覆盖
    let hide_args_with_force = HideArgs {
        force: true,
        ..hide_text(&image_path, "some text", Some(dest_path.clone()))
    };
    let result = handle_hide(hide_args_with_force);
    assert!(
        result.is_ok(),
        "Execution should succeed with --force when file exists."
    );

    // 验证文件确实被覆盖（内容不再是 "this is a dummy file..."）
    let dummy_content = fs::read(&dest_path)?;
    assert_ne!(dummy_content, b"this is a dummy file to be overwritten");

    Ok(())
}

/// 验证空间不足时的错误处理
#[test]
fn test_handle_hide_not_enough_space() -> anyhow::Result<()> {
    // 1. 准备环境
    let dir = tempdir()?;
    let image_path = dir.path().join("small.png");
    let dest_path = dir.path().join("dest.png");

    // 创建一个非常小的图片
    create_test_image(&image_path, 10, 10);
    // 创建一个非常大的文本
    let large_text = "a".repeat(5000);

    // 2. 执行并断言错误
    let result = handle_hide(hide_text(&image_path, &large_text, Some(dest_path.clone())));

    assert!(result.is_err());
    if let Err(e) = result {
        assert!(e.to_string().contains("Not enough space"));
    }
    assert!(!dest_path.exists(), "No output should be written on failure.");

    Ok(())
}

/// 验证错误口令和过短口令都会被拒绝
#[test]
fn test_recover_with_wrong_or_short_password() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("image.png");
    let hidden_path = dir.path().join("hidden.png");
    let output_path = dir.path().join("out.txt");

    create_test_image(&image_path, 40, 40);
    handle_hide(hide_text(&image_path, "top secret", Some(hidden_path.clone())))?;

    let wrong = RecoverArgs {
        password: "not the password".to_string(),
        ..recover_to(&hidden_path, Some(output_path.clone()))
    };
    let err = handle_recover(wrong).unwrap_err();
    assert!(format!("{err:#}").contains("decryption failed"));
    assert!(!output_path.exists());

    let short = RecoverArgs {
        password: "abc".to_string(),
        ..recover_to(&hidden_path, Some(output_path.clone()))
    };
    let err = handle_recover(short).unwrap_err();
    assert!(err.to_string().contains("Password too short"));

    Ok(())
}

/// 验证未隐藏任何数据的图像报告“未找到数据”
#[test]
fn test_recover_from_untouched_image() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("blank.png");
    let blank: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::new(30, 30);
    blank.save(&image_path)?;

    let err = handle_recover(recover_to(&image_path, Some(dir.path().join("out.txt"))))
        .unwrap_err();
    assert!(format!("{err:#}").contains("no hidden data detected"));

    Ok(())
}

/// 验证隐写结果经过 PNG 编码和解码后仍然完整
#[test]
fn test_png_survives_round_trip_through_disk() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("carrier.png");
    let hidden_path = dir.path().join("hidden.png");

    create_test_image(&image_path, 64, 64);
    let carrier = image::open(&image_path)?;

    let hidden = embed(&carrier, b"hello", "txt", 0, "secret1")?;
    hidden.save(&hidden_path)?;

    let reloaded: DynamicImage = image::open(&hidden_path)?;
    let recovered = extract(&reloaded, 0, "secret1")?;
    assert_eq!(recovered.data, b"hello");
    assert_eq!(recovered.extension, "txt");

    assert_eq!(
        extract(&reloaded, 0, "wrong12"),
        Err(StegoError::DecryptionFailed)
    );

    Ok(())
}

/// 验证空文本不会被隐藏
#[test]
fn test_hide_rejects_empty_text() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("image.png");
    let dest_path = dir.path().join("dest.png");
    create_test_image(&image_path, 20, 20);

    let err = handle_hide(hide_text(&image_path, "", Some(dest_path.clone()))).unwrap_err();
    assert!(err.to_string().contains("No text to hide"));
    assert!(!dest_path.exists());

    Ok(())
}

/// 验证非 `.png` 的目标路径仍然得到 PNG 编码的图像
#[test]
fn test_non_png_destination_is_still_png() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("image.png");
    let dest_path = dir.path().join("hidden.bmp");
    create_test_image(&image_path, 30, 30);

    handle_hide(hide_text(&image_path, "bmp name", Some(dest_path.clone())))?;

    let bytes = fs::read(&dest_path)?;
    assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]));

    let recovered = extract(&image::load_from_memory(&bytes)?, 0, PASSWORD)?;
    assert_eq!(recovered.data, b"bmp name");

    Ok(())
}

/// 验证 `--print` 模式不会写出任何文件
#[test]
fn test_recover_print_writes_no_file() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("image.png");
    let hidden_path = dir.path().join("hidden.png");
    create_test_image(&image_path, 30, 30);
    handle_hide(hide_text(&image_path, "to stdout", Some(hidden_path.clone())))?;

    let print_args = RecoverArgs {
        print: true,
        ..recover_to(&hidden_path, None)
    };
    handle_recover(print_args)?;

    assert!(!dir.path().join("recovered_hidden.txt").exists());

    Ok(())
}

/// 验证 capacity 子命令能读取图像，并在文件缺失时报错
#[test]
fn test_handle_capacity() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("image.png");
    create_test_image(&image_path, 16, 16);

    handle_capacity(CapacityArgs {
        image: image_path,
        offset: 10,
    })?;

    let missing = handle_capacity(CapacityArgs {
        image: dir.path().join("missing.png"),
        offset: 0,
    });
    assert!(missing.is_err());
    if let Err(e) = missing {
        assert!(e.to_string().contains("Unable to read image file"));
    }

    Ok(())
}
