use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use dxfview_config::{AppConfig, ConfigError, OutputFormat};
use dxfview_io::{DocumentLoader, DxfFacade, ParseOptions, ParsedDrawing};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

mod output;

/// 将 DXF 子集解析为二维线段列表。
#[derive(Debug, Parser)]
#[command(name = "dxfview", version)]
struct Cli {
    /// DXF 文件路径，`-` 表示从标准输入读取
    input: PathBuf,
    /// 配置文件路径，覆盖自动发现
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum)]
    format: Option<FormatArg>,
    /// CIRCLE/ARC 离散段数
    #[arg(long)]
    arc_segments: Option<usize>,
    /// 块内 INSERT 的展开层数
    #[arg(long)]
    max_insert_depth: Option<usize>,
    /// JSON 输出不缩进
    #[arg(long)]
    compact: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Summary,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Summary => OutputFormat::Summary,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let (mut config, config_error) = load_configuration(cli.config.clone());
    init_logging(&config);
    if let Some(err) = &config_error {
        report_config_error(err);
    }
    apply_overrides(&mut config, &cli);

    if let Err(err) = run(&cli, &config) {
        error!("{err:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli, config: &AppConfig) -> Result<()> {
    config.validate().context("配置校验失败")?;

    let facade = DxfFacade::with_options(ParseOptions {
        arc_segments: config.parser.arc_segments,
        max_insert_depth: config.parser.max_insert_depth,
    });
    let parsed = load_input(&facade, &cli.input)?;
    info!(
        segments = parsed.drawing.len(),
        entities = parsed.report.entity_count(),
        blocks = parsed.report.blocks_defined,
        "DXF 解析完成"
    );
    if parsed.report.has_skips() {
        debug!(report = ?parsed.report, "解析过程中跳过了部分内容");
    }

    let label = if is_stdin(&cli.input) {
        "<stdin>".to_string()
    } else {
        cli.input.display().to_string()
    };
    let mut stdout = io::stdout().lock();
    match config.output.format {
        OutputFormat::Summary => output::write_summary(&mut stdout, &label, &parsed)?,
        OutputFormat::Json => output::write_json(&mut stdout, &parsed, config.output.pretty)?,
    }
    Ok(())
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn load_input(facade: &DxfFacade, path: &Path) -> Result<ParsedDrawing> {
    if is_stdin(path) {
        let mut bytes = Vec::new();
        io::stdin()
            .read_to_end(&mut bytes)
            .context("读取标准输入失败")?;
        return facade.load_bytes(&bytes).context("解码标准输入失败");
    }
    facade
        .load(path)
        .with_context(|| format!("加载 DXF 文件 {} 失败", path.display()))
}

fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(format) = cli.format {
        config.output.format = format.into();
    }
    if let Some(segments) = cli.arc_segments {
        config.parser.arc_segments = segments;
    }
    if let Some(depth) = cli.max_insert_depth {
        config.parser.max_insert_depth = depth;
    }
    if cli.compact {
        config.output.pretty = false;
    }
}

/// 加载失败时回退到默认配置，并把错误交给调用方在日志初始化后记录。
fn load_configuration(override_path: Option<PathBuf>) -> (AppConfig, Option<ConfigError>) {
    let loaded = match override_path {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::discover(),
    };
    match loaded {
        Ok(cfg) => (cfg, None),
        Err(err) => (AppConfig::default(), Some(err)),
    }
}

fn report_config_error(err: &ConfigError) {
    match err {
        ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
            warn!(path = %path.display(), error = %err, "加载配置失败，使用内建默认值");
        }
        ConfigError::Invalid { .. } | ConfigError::Context { .. } => {
            warn!(error = %err, "加载配置失败，使用内建默认值");
        }
    }
}

/// 日志统一写到 stderr，stdout 只保留解析结果。
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
