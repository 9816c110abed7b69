//! 单遍扫描：跟踪当前段落与正在定义的块，把实体分派给解析函数。

use dxfview_core::drawing::Drawing;
use tracing::{debug, trace};

use crate::blocks::{Block, BlockItem, BlockRegistry, Insert, InsertResolver};
use crate::entities::{self, EntityGeometry, EntityKind};
use crate::reader::{Tag, TagCursor};
use crate::report::ParseReport;
use crate::{ParseOptions, ParsedDrawing};

/// 当前所在的段落。只有 BLOCKS 与 ENTITIES 具有语义，其余段落的内容被原样跳过。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    Outside,
    Header,
    Classes,
    Tables,
    Blocks,
    Entities,
    Objects,
    Other(String),
}

impl Section {
    pub fn from_name(name: &str) -> Self {
        match name {
            "HEADER" => Self::Header,
            "CLASSES" => Self::Classes,
            "TABLES" => Self::Tables,
            "BLOCKS" => Self::Blocks,
            "ENTITIES" => Self::Entities,
            "OBJECTS" => Self::Objects,
            other => Self::Other(other.to_string()),
        }
    }
}

/// 正在 BLOCK ... ENDBLK 之间收集的块。
#[derive(Debug, Default)]
struct BlockBuilder {
    name: Option<String>,
    items: Vec<BlockItem>,
}

pub(crate) struct Scanner<'t, 'a> {
    cursor: TagCursor<'t, 'a>,
    options: ParseOptions,
    section: Section,
    current_block: Option<BlockBuilder>,
    registry: BlockRegistry,
    drawing: Drawing,
    report: ParseReport,
}

impl<'t, 'a> Scanner<'t, 'a> {
    pub(crate) fn new(tags: &'t [Tag<'a>], options: ParseOptions) -> Self {
        let report = ParseReport {
            tags: tags.len(),
            ..ParseReport::default()
        };
        Self {
            cursor: TagCursor::new(tags),
            options,
            section: Section::Outside,
            current_block: None,
            registry: BlockRegistry::new(),
            drawing: Drawing::new(),
            report,
        }
    }

    pub(crate) fn run(mut self) -> ParsedDrawing {
        while let Some(tag) = self.cursor.next() {
            if tag.is_marker() {
                self.handle_marker(tag.value());
            } else {
                self.handle_attribute(tag);
            }
        }
        self.discard_open_block();

        debug!(
            segments = self.drawing.len(),
            blocks = self.registry.len(),
            dropped = self.report.dropped_segments,
            "DXF 解析完成"
        );
        ParsedDrawing {
            drawing: self.drawing,
            report: self.report,
        }
    }

    fn handle_marker(&mut self, value: &str) {
        match value {
            "SECTION" => self.enter_section(),
            "ENDSEC" => {
                self.discard_open_block();
                self.section = Section::Outside;
            }
            "BLOCK" if self.section == Section::Blocks => {
                self.discard_open_block();
                self.current_block = Some(BlockBuilder::default());
            }
            "ENDBLK" if self.section == Section::Blocks => self.commit_block(),
            kind => self.handle_entity(kind),
        }
    }

    /// 非组码 0 的组码只在块头部有意义：第一个组码 2 为块名。
    fn handle_attribute(&mut self, tag: Tag<'_>) {
        if !tag.has_code(2) {
            return;
        }
        if let Some(block) = self.current_block.as_mut() {
            if block.name.is_none() {
                block.name = Some(tag.value().to_string());
            }
        }
    }

    fn enter_section(&mut self) {
        self.discard_open_block();
        let name = match self.cursor.peek() {
            Some(tag) if tag.has_code(2) => {
                self.cursor.next();
                tag.value()
            }
            _ => "",
        };
        trace!(section = name, "进入段落");
        self.section = Section::from_name(name);
    }

    fn commit_block(&mut self) {
        let Some(builder) = self.current_block.take() else {
            return;
        };
        match builder.name {
            Some(name) => {
                debug!(block = %name, items = builder.items.len(), "块定义完成");
                self.registry.define(Block::new(name, builder.items));
                self.report.blocks_defined += 1;
            }
            None => {
                debug!("BLOCK 缺少名称（组码 2），丢弃");
                self.report.unnamed_blocks += 1;
            }
        }
    }

    fn discard_open_block(&mut self) {
        if self.current_block.take().is_some() {
            debug!("BLOCK 未找到 ENDBLK 终止标记，丢弃");
            self.report.unterminated_blocks += 1;
        }
    }

    fn handle_entity(&mut self, kind: &str) {
        let in_block = self.section == Section::Blocks && self.current_block.is_some();
        if !in_block && self.section != Section::Entities {
            return;
        }

        let Some(entity) = EntityKind::from_name(kind) else {
            trace!(kind, "跳过不支持的实体");
            self.report.record_ignored(kind);
            self.cursor.take_body();
            return;
        };
        self.report.record_entity(entity.name());

        let arc_segments = self.options.arc_segments;
        let geometry = match entity {
            EntityKind::Line => entities::parse_line(self.cursor.take_body()),
            EntityKind::Circle => entities::parse_circle(self.cursor.take_body(), arc_segments),
            EntityKind::Arc => entities::parse_arc(self.cursor.take_body(), arc_segments),
            EntityKind::LwPolyline => entities::parse_lwpolyline(self.cursor.take_body()),
            EntityKind::Polyline => entities::parse_polyline(&mut self.cursor),
            EntityKind::Insert => {
                let insert = entities::parse_insert(self.cursor.take_body());
                self.place_insert(insert);
                return;
            }
        };
        self.place_geometry(entity, geometry);
    }

    fn place_geometry(&mut self, entity: EntityKind, geometry: EntityGeometry) {
        if geometry.incomplete {
            trace!(kind = entity.name(), "实体缺少必需字段，跳过");
            self.report.incomplete_entities += 1;
        }
        self.report.dropped_segments += geometry.dropped;
        match self.current_block.as_mut() {
            Some(block) => block
                .items
                .extend(geometry.segments.into_iter().map(BlockItem::Segment)),
            None => self.drawing.extend(geometry.segments),
        }
    }

    fn place_insert(&mut self, insert: Insert) {
        match self.current_block.as_mut() {
            Some(block) => block.items.push(BlockItem::Insert(insert)),
            None => {
                let resolver = InsertResolver::new(&self.registry, self.options.max_insert_depth);
                resolver.resolve(&insert, &mut self.drawing, &mut self.report);
            }
        }
    }
}
