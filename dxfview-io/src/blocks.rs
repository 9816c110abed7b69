use std::collections::HashMap;

use dxfview_core::drawing::Drawing;
use dxfview_core::geometry::{InsertTransform, Segment};
use glam::DAffine2;
use tracing::debug;

use crate::report::ParseReport;

/// 块引用：块名缺失时 `block_name` 为 `None`。
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub block_name: Option<String>,
    pub transform: InsertTransform,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockItem {
    Segment(Segment),
    /// 块内部的 INSERT，仅在允许嵌套展开时使用。
    Insert(Insert),
}

/// 已完成的块定义。提交到注册表后不再修改。
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub name: String,
    pub items: Vec<BlockItem>,
}

impl Block {
    pub fn new(name: impl Into<String>, items: Vec<BlockItem>) -> Self {
        Self {
            name: name.into(),
            items,
        }
    }
}

/// 按名称保存块定义；同名定义后者覆盖前者。
#[derive(Debug, Clone, Default)]
pub struct BlockRegistry {
    blocks: HashMap<String, Block>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, block: Block) {
        self.blocks.insert(block.name.clone(), block);
    }

    pub fn lookup(&self, name: &str) -> Option<&Block> {
        self.blocks.get(name)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// 将 INSERT 展开为世界坐标线段。
///
/// `max_depth` 为允许展开的嵌套层数：0 表示只展开顶层引用的块本身，
/// 块内再出现的 INSERT 一律跳过。
pub struct InsertResolver<'r> {
    registry: &'r BlockRegistry,
    max_depth: usize,
}

impl<'r> InsertResolver<'r> {
    pub fn new(registry: &'r BlockRegistry, max_depth: usize) -> Self {
        Self {
            registry,
            max_depth,
        }
    }

    pub fn resolve(&self, insert: &Insert, drawing: &mut Drawing, report: &mut ParseReport) {
        self.resolve_at(insert, &DAffine2::IDENTITY, 0, drawing, report);
    }

    fn resolve_at(
        &self,
        insert: &Insert,
        parent: &DAffine2,
        depth: usize,
        drawing: &mut Drawing,
        report: &mut ParseReport,
    ) {
        let Some(name) = insert.block_name.as_deref() else {
            report.anonymous_inserts += 1;
            return;
        };
        let Some(block) = self.registry.lookup(name) else {
            debug!(block = name, "INSERT 引用的块不存在，忽略");
            report.record_missing_block(name);
            return;
        };

        let affine = *parent * insert.transform.to_affine();
        for item in &block.items {
            match item {
                BlockItem::Segment(segment) => match segment.transformed(&affine) {
                    Some(segment) => drawing.push(segment),
                    None => report.dropped_segments += 1,
                },
                BlockItem::Insert(nested) => {
                    if depth < self.max_depth {
                        self.resolve_at(nested, &affine, depth + 1, drawing, report);
                    } else {
                        report.nested_inserts_skipped += 1;
                    }
                }
            }
        }
    }
}
