use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use dxfview_io::ParsedDrawing;

const TOLERANCE: f64 = 1e-9;

#[derive(Debug, Serialize, Deserialize)]
pub struct GoldenDrawing {
    segments: Vec<[f64; 4]>,
    #[serde(default)]
    entities: BTreeMap<String, usize>,
    #[serde(default)]
    ignored_entities: BTreeMap<String, usize>,
    #[serde(default)]
    missing_blocks: BTreeMap<String, usize>,
    #[serde(default)]
    blocks_defined: usize,
}

impl GoldenDrawing {
    fn from_parsed(parsed: &ParsedDrawing) -> Self {
        Self {
            segments: parsed
                .drawing
                .segments()
                .iter()
                .map(|segment| segment.coords())
                .collect(),
            entities: parsed.report.entities.clone(),
            ignored_entities: parsed.report.ignored_entities.clone(),
            missing_blocks: parsed.report.missing_blocks.clone(),
            blocks_defined: parsed.report.blocks_defined,
        }
    }

    /// 三角函数带来的末位误差在容差内视为一致。
    fn matches(&self, other: &GoldenDrawing) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| a.iter().zip(b).all(|(x, y)| (x - y).abs() < TOLERANCE))
            && self.entities == other.entities
            && self.ignored_entities == other.ignored_entities
            && self.missing_blocks == other.missing_blocks
            && self.blocks_defined == other.blocks_defined
    }
}

pub fn assert_golden(name: &str, parsed: &ParsedDrawing) {
    let snapshot = GoldenDrawing::from_parsed(parsed);
    let base_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/golden");
    if let Err(err) = fs::create_dir_all(&base_dir) {
        panic!("无法创建黄金数据目录 {}: {err}", base_dir.display());
    }
    let golden_path = base_dir.join(format!("{name}.json"));
    let serialized = serde_json::to_string_pretty(&snapshot).expect("序列化黄金快照失败");

    if !golden_path.exists() {
        fs::write(&golden_path, &serialized)
            .unwrap_or_else(|err| panic!("写入黄金文件 {} 失败: {err}", golden_path.display()));
        panic!(
            "黄金文件 {} 不存在，已自动生成。请确认内容后重新运行测试。",
            golden_path.display()
        );
    }

    let expected_str = fs::read_to_string(&golden_path)
        .unwrap_or_else(|err| panic!("读取黄金文件 {} 失败: {err}", golden_path.display()));
    let expected: GoldenDrawing = serde_json::from_str(&expected_str)
        .unwrap_or_else(|err| panic!("解析黄金文件 {} 失败: {err}", golden_path.display()));

    if !expected.matches(&snapshot) {
        let diff_path = base_dir.join(format!("{name}.actual.json"));
        fs::write(&diff_path, &serialized).expect("写入差异文件失败");
        panic!(
            "黄金文件 {} 与当前解析结果不一致。已生成对照输出 {}。",
            golden_path.display(),
            diff_path.display()
        );
    }
}
