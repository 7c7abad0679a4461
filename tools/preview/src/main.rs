//! 预览 BoxSup 数据集.
//!
//! 打印数据集概况和每个样本的形状, 并把 "图像在上、标签在下" 的拼接图保存为 png.
//!
//! 用法: `preview [OUT_DIR] [--image-labels] [--lax] [--sigma SIGMA]`
//!
//! 数据集位置见 `utils::loader::root_dir_from_env_or_home`.

use boxsup::prelude::*;
use std::error::Error as StdError;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;
use utils::loader;

const DEFAULT_OUT_DIR: &str = "boxsup-preview";

/// 命令行参数.
#[derive(Debug)]
struct Args {
    out_dir: PathBuf,
    label_kind: LabelKind,
    validate_names: bool,
    sigma: Option<f32>,
}

impl Args {
    fn parse() -> Result<Self, String> {
        let mut args = Args {
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            label_kind: LabelKind::Mask,
            validate_names: true,
            sigma: None,
        };

        let mut it = std::env::args().skip(1);
        while let Some(a) = it.next() {
            match a.as_str() {
                "--image-labels" => args.label_kind = LabelKind::Image,
                "--lax" => args.validate_names = false,
                "--sigma" => {
                    let v = it.next().ok_or("`--sigma` needs a value")?;
                    let sigma = v.parse().map_err(|_| format!("bad sigma `{v}`"))?;
                    args.sigma = Some(sigma);
                }
                flag if flag.starts_with("--") => return Err(format!("unknown flag `{flag}`")),
                dir => args.out_dir = PathBuf::from(dir),
            }
        }
        Ok(args)
    }

    fn builder(&self) -> Result<DatasetBuilder, TransformError> {
        let mut builder = loader::builder_from_env_or_home()
            .label_kind(self.label_kind)
            .validate_names(self.validate_names);
        if let Some(sigma) = self.sigma {
            builder = builder.image_transform(Denoise::new(Gaussian::with_sigma(sigma)?, true));
        }
        Ok(builder)
    }
}

/// 读取 `range` 内的样本并保存拼接图, 返回成功个数.
fn preview_range(ds: &BoxSupDataset, range: std::ops::Range<usize>, out: &Path) -> usize {
    let mut ok = 0;
    for i in range {
        let sample = match ds.get(i) {
            Ok(s) => s,
            Err(e) => {
                log::error!("sample {i}: {e}");
                continue;
            }
        };
        println!(
            "#{i:04}: image {:?} {}, label {:?} {}",
            sample.image.shape(),
            sample.image.dtype(),
            sample.label.shape(),
            sample.label.dtype()
        );

        let path = out.join(format!("{i:04}.png"));
        match sample.save(&path) {
            Ok(()) => ok += 1,
            Err(e) => log::error!("cannot save {}: {e}", path.display()),
        }
    }
    ok
}

/// 汇总各线程的保存个数. 任一线程 panic 时返回错误.
fn total_saved<I: IntoIterator<Item = thread::Result<usize>>>(results: I) -> Result<usize, String> {
    results
        .into_iter()
        .enumerate()
        .map(|(i, r)| r.map_err(|_| format!("preview worker #{i} panicked")))
        .sum()
}

fn main() -> Result<(), Box<dyn StdError>> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()?;

    let args = Args::parse()?;
    let ds = args.builder()?.build()?;
    utils::sep();
    println!("{ds}");
    utils::sep();

    std::fs::create_dir_all(&args.out_dir)?;
    let out = args.out_dir.as_path();
    let ds = &ds;

    let start = Instant::now();
    let saved = thread::scope(|s| {
        let handles: Vec<_> = utils::split_range(ds.len(), utils::cpus())
            .into_iter()
            .map(|r| s.spawn(move || preview_range(ds, r, out)))
            .collect();
        total_saved(handles.into_iter().map(|h| h.join()))
    })?;

    utils::sep();
    println!(
        "Saved {saved}/{} previews to {} in {:.3} s",
        ds.len(),
        out.display(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
