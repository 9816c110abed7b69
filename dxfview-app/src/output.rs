use std::collections::BTreeMap;
use std::io::{self, Write};

use dxfview_core::geometry::{Bounds2D, Segment};
use dxfview_io::{ParseReport, ParsedDrawing};
use serde::Serialize;

#[derive(Serialize)]
struct JsonOutput<'a> {
    segments: &'a [Segment],
    bounds: Option<Bounds2D>,
    report: &'a ParseReport,
}

/// 供外部渲染器消费的 JSON：线段、范围与解析统计。
pub fn write_json<W: Write>(out: &mut W, parsed: &ParsedDrawing, pretty: bool) -> io::Result<()> {
    let payload = JsonOutput {
        segments: parsed.drawing.segments(),
        bounds: parsed.drawing.bounds(),
        report: &parsed.report,
    };
    if pretty {
        serde_json::to_writer_pretty(&mut *out, &payload)?;
    } else {
        serde_json::to_writer(&mut *out, &payload)?;
    }
    writeln!(out)
}

/// 人类可读的概览，格式参照 CLI 演示的输出。
pub fn write_summary<W: Write>(out: &mut W, source: &str, parsed: &ParsedDrawing) -> io::Result<()> {
    let drawing = &parsed.drawing;
    let report = &parsed.report;

    writeln!(out, "DXF 线段概览")?;
    writeln!(out, "来源：{source}")?;
    writeln!(out, "组码数量：{}", report.tags)?;
    writeln!(out, "线段数量：{}", drawing.len())?;
    writeln!(out, "块定义数量：{}", report.blocks_defined)?;
    writeln!(out, "实体统计：{}", join_counts(&report.entities))?;

    match drawing.bounds() {
        Some(bounds) => writeln!(
            out,
            "范围：({:.4}, {:.4}) - ({:.4}, {:.4})，宽={:.4}，高={:.4}",
            bounds.min().x(),
            bounds.min().y(),
            bounds.max().x(),
            bounds.max().y(),
            bounds.width(),
            bounds.height()
        )?,
        None => writeln!(out, "范围：空")?,
    }

    if report.has_skips() {
        writeln!(out, "跳过内容：")?;
        if !report.ignored_entities.is_empty() {
            writeln!(out, "  - 未支持的实体：{}", join_counts(&report.ignored_entities))?;
        }
        if report.incomplete_entities > 0 {
            writeln!(out, "  - 缺少字段的实体：{}", report.incomplete_entities)?;
        }
        if report.dropped_segments > 0 {
            writeln!(out, "  - 丢弃的线段：{}", report.dropped_segments)?;
        }
        if !report.missing_blocks.is_empty() {
            writeln!(out, "  - 未找到的块：{}", join_counts(&report.missing_blocks))?;
        }
        if report.anonymous_inserts > 0 {
            writeln!(out, "  - 缺少块名的 INSERT：{}", report.anonymous_inserts)?;
        }
        if report.nested_inserts_skipped > 0 {
            writeln!(out, "  - 未展开的嵌套 INSERT：{}", report.nested_inserts_skipped)?;
        }
        if report.unnamed_blocks > 0 || report.unterminated_blocks > 0 {
            writeln!(
                out,
                "  - 丢弃的块定义：缺少名称 {}，未终止 {}",
                report.unnamed_blocks, report.unterminated_blocks
            )?;
        }
    }

    writeln!(out, "线段列表：")?;
    for (index, segment) in drawing.segments().iter().enumerate() {
        let [x1, y1, x2, y2] = segment.coords();
        writeln!(out, "  #{index} ({x1:.4}, {y1:.4}) -> ({x2:.4}, {y2:.4})")?;
    }
    Ok(())
}

fn join_counts(counts: &BTreeMap<String, usize>) -> String {
    if counts.is_empty() {
        return "无".to_string();
    }
    counts
        .iter()
        .map(|(name, count)| format!("{name}={count}"))
        .collect::<Vec<_>>()
        .join(", ")
}
