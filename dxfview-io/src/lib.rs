pub mod blocks;
pub mod entities;
pub mod reader;
pub mod report;
mod scanner;

use std::fs;
use std::path::Path;

use dxfview_core::drawing::Drawing;
use thiserror::Error;
use tracing::debug;

pub use report::ParseReport;

/// CIRCLE/ARC 默认离散为 48 段。
pub const DEFAULT_ARC_SEGMENTS: usize = 48;
/// 离散段数上限，超出部分按上限处理。
pub const MAX_ARC_SEGMENTS: usize = 4096;
/// 嵌套 INSERT 展开层数上限；自引用块每层可能成倍放大线段数。
pub const MAX_INSERT_DEPTH: usize = 16;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("DXF 内容不是有效的 UTF-8（字节偏移 {offset}）")]
    DecodeError {
        offset: usize,
        #[source]
        source: std::str::Utf8Error,
    },
}

/// 解析参数。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// CIRCLE 与 ARC 的离散段数；为 0 时曲线不产生线段。
    pub arc_segments: usize,
    /// 块内 INSERT 的展开层数；0 表示不展开嵌套引用。
    pub max_insert_depth: usize,
}

impl ParseOptions {
    /// 把两个参数收敛到各自的上限以内。
    pub fn clamped(self) -> Self {
        Self {
            arc_segments: self.arc_segments.min(MAX_ARC_SEGMENTS),
            max_insert_depth: self.max_insert_depth.min(MAX_INSERT_DEPTH),
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            arc_segments: DEFAULT_ARC_SEGMENTS,
            max_insert_depth: 0,
        }
    }
}

/// 解析结果与统计信息。
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDrawing {
    pub drawing: Drawing,
    pub report: ParseReport,
}

/// DXF 子集解析器。不持有任何跨调用的状态，可在多线程中并发使用。
#[derive(Debug, Clone, Copy, Default)]
pub struct DxfParser {
    options: ParseOptions,
}

impl DxfParser {
    /// 超出上限的参数会被收敛，见 [`ParseOptions::clamped`]。
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options: options.clamped(),
        }
    }

    pub fn options(&self) -> ParseOptions {
        self.options
    }

    /// 解析文本为线段列表。对残缺或未知内容静默跳过，永不失败。
    pub fn parse(&self, source: &str) -> ParsedDrawing {
        let tags = reader::tokenize(source);
        scanner::Scanner::new(&tags, self.options).run()
    }
}

/// 使用默认参数解析，只返回图纸。
pub fn parse_dxf(source: &str) -> Drawing {
    DxfParser::default().parse(source).drawing
}

/// 外部边界：把字节解码为文本，去掉可选的 UTF-8 BOM。
pub fn decode_dxf(bytes: &[u8]) -> Result<&str, IoError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    std::str::from_utf8(bytes).map_err(|source| IoError::DecodeError {
        offset: source.valid_up_to(),
        source,
    })
}

pub trait DocumentLoader {
    fn load(&self, path: &Path) -> Result<ParsedDrawing, IoError>;
}

pub struct DxfFacade {
    parser: DxfParser,
}

impl DxfFacade {
    pub fn new() -> Self {
        Self::with_options(ParseOptions::default())
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            parser: DxfParser::new(options),
        }
    }

    /// 解码并解析已在内存中的文件内容。
    pub fn load_bytes(&self, bytes: &[u8]) -> Result<ParsedDrawing, IoError> {
        let text = decode_dxf(bytes)?;
        Ok(self.parser.parse(text))
    }
}

impl Default for DxfFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLoader for DxfFacade {
    fn load(&self, path: &Path) -> Result<ParsedDrawing, IoError> {
        let data = fs::read(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = data.len(), "读取 DXF 文件");
        self.load_bytes(&data)
    }
}
