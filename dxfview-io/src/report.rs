use std::collections::BTreeMap;

use serde::Serialize;

/// 解析过程的统计信息。
///
/// 解析器对残缺内容一律静默跳过，这里只记录跳过了什么，不改变结果。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseReport {
    /// 切分出的组码/值对数量。
    pub tags: usize,
    /// 按类型统计已分派给解析函数的实体。
    pub entities: BTreeMap<String, usize>,
    /// ENTITIES 段或块内出现、但不在支持列表中的实体类型。
    pub ignored_entities: BTreeMap<String, usize>,
    /// 缺少必需字段、整体未产生几何的实体数量。
    pub incomplete_entities: usize,
    /// 因坐标缺失或非有限值而丢弃的线段数量。
    pub dropped_segments: usize,
    pub blocks_defined: usize,
    pub unnamed_blocks: usize,
    pub unterminated_blocks: usize,
    /// INSERT 引用了不存在的块，按块名计数。
    pub missing_blocks: BTreeMap<String, usize>,
    pub anonymous_inserts: usize,
    pub nested_inserts_skipped: usize,
}

impl ParseReport {
    pub fn record_entity(&mut self, kind: &str) {
        *self.entities.entry(kind.to_string()).or_default() += 1;
    }

    pub fn record_ignored(&mut self, kind: &str) {
        *self.ignored_entities.entry(kind.to_string()).or_default() += 1;
    }

    pub fn record_missing_block(&mut self, name: &str) {
        *self.missing_blocks.entry(name.to_string()).or_default() += 1;
    }

    pub fn entity_count(&self) -> usize {
        self.entities.values().sum()
    }

    /// 是否有任何内容被跳过或丢弃。
    pub fn has_skips(&self) -> bool {
        !self.ignored_entities.is_empty()
            || self.incomplete_entities > 0
            || self.dropped_segments > 0
            || self.unnamed_blocks > 0
            || self.unterminated_blocks > 0
            || !self.missing_blocks.is_empty()
            || self.anonymous_inserts > 0
            || self.nested_inserts_skipped > 0
    }
}
