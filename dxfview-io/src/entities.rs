//! 各类实体的组码解析与离散化。
//!
//! 每个解析函数接收单个实体的组码切片（到下一个组码 0 为止），
//! 返回局部坐标下的线段。缺失或非法的数值不会报错，只会让对应线段被丢弃。

use std::f64::consts::TAU;

use dxfview_core::geometry::{InsertTransform, Point2, Segment, Vector2};

use crate::MAX_ARC_SEGMENTS;
use crate::blocks::Insert;
use crate::reader::{Tag, TagCursor};

/// 扫描器会分派给解析函数的实体类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Line,
    LwPolyline,
    Polyline,
    Arc,
    Circle,
    Insert,
}

impl EntityKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "LINE" => Some(Self::Line),
            "LWPOLYLINE" => Some(Self::LwPolyline),
            "POLYLINE" => Some(Self::Polyline),
            "ARC" => Some(Self::Arc),
            "CIRCLE" => Some(Self::Circle),
            "INSERT" => Some(Self::Insert),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Line => "LINE",
            Self::LwPolyline => "LWPOLYLINE",
            Self::Polyline => "POLYLINE",
            Self::Arc => "ARC",
            Self::Circle => "CIRCLE",
            Self::Insert => "INSERT",
        }
    }
}

/// 单个实体产生的线段，以及因坐标缺失/非有限而被丢弃的数量。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityGeometry {
    pub segments: Vec<Segment>,
    pub dropped: usize,
    /// 实体缺少必需字段（如圆心、半径），整体未产生几何。
    pub incomplete: bool,
}

impl EntityGeometry {
    fn push(&mut self, segment: Option<Segment>) {
        match segment {
            Some(segment) => self.segments.push(segment),
            None => self.dropped += 1,
        }
    }

    fn incomplete() -> Self {
        Self {
            incomplete: true,
            ..Self::default()
        }
    }
}

/// 同一组码出现多次时以最后一次为准；值无法解析时视为缺失。
fn number(body: &[Tag<'_>], code: i32) -> Option<f64> {
    body.iter()
        .rev()
        .find(|tag| tag.has_code(code))
        .and_then(|tag| tag.as_f64())
}

/// 缺少端点字段时整体视为不完整；字段齐全但非有限值时计入丢弃。
pub fn parse_line(body: &[Tag<'_>]) -> EntityGeometry {
    let (Some(x1), Some(y1), Some(x2), Some(y2)) = (
        number(body, 10),
        number(body, 20),
        number(body, 11),
        number(body, 21),
    ) else {
        return EntityGeometry::incomplete();
    };
    let mut geometry = EntityGeometry::default();
    geometry.push(Segment::try_new(Point2::new(x1, y1), Point2::new(x2, y2)));
    geometry
}

pub fn parse_circle(body: &[Tag<'_>], arc_segments: usize) -> EntityGeometry {
    let (Some(cx), Some(cy), Some(radius)) = (number(body, 10), number(body, 20), number(body, 40))
    else {
        return EntityGeometry::incomplete();
    };
    tessellate_arc(Point2::new(cx, cy), radius, 0.0, TAU, arc_segments)
}

/// 角度（组码 50/51）以度为单位；终止角小于起始角时按原样反向扫掠。
pub fn parse_arc(body: &[Tag<'_>], arc_segments: usize) -> EntityGeometry {
    let (Some(cx), Some(cy), Some(radius), Some(start), Some(end)) = (
        number(body, 10),
        number(body, 20),
        number(body, 40),
        number(body, 50),
        number(body, 51),
    ) else {
        return EntityGeometry::incomplete();
    };
    tessellate_arc(
        Point2::new(cx, cy),
        radius,
        start.to_radians(),
        end.to_radians(),
        arc_segments,
    )
}

/// 从 `start` 到 `end`（弧度）等分为 `count` 段，`count` 不超过 [`MAX_ARC_SEGMENTS`]。
pub fn tessellate_arc(
    center: Point2,
    radius: f64,
    start: f64,
    end: f64,
    count: usize,
) -> EntityGeometry {
    let mut geometry = EntityGeometry::default();
    let count = count.min(MAX_ARC_SEGMENTS);
    if count == 0 {
        return geometry;
    }
    let step = (end - start) / count as f64;
    let point_at = |t: f64| Point2::new(center.x() + radius * t.cos(), center.y() + radius * t.sin());
    for k in 0..count {
        let t0 = start + k as f64 * step;
        let t1 = start + (k + 1) as f64 * step;
        geometry.push(Segment::try_new(point_at(t0), point_at(t1)));
    }
    geometry
}

#[derive(Debug, Default)]
struct PartialVertex {
    x: Option<f64>,
    y: Option<f64>,
    has_y: bool,
}

impl PartialVertex {
    fn point(&self) -> Option<Point2> {
        Some(Point2::new(self.x?, self.y?))
    }
}

/// 顶点由重复的 10/20 组成；组码 70 的第 0 位表示闭合。
pub fn parse_lwpolyline(body: &[Tag<'_>]) -> EntityGeometry {
    let mut vertices: Vec<PartialVertex> = Vec::new();
    let mut flags = 0;
    for tag in body {
        match tag.code() {
            Some(10) => vertices.push(PartialVertex {
                x: tag.as_f64(),
                ..PartialVertex::default()
            }),
            Some(20) => match vertices.last_mut() {
                Some(vertex) if !vertex.has_y => {
                    vertex.y = tag.as_f64();
                    vertex.has_y = true;
                }
                _ => vertices.push(PartialVertex {
                    x: None,
                    y: tag.as_f64(),
                    has_y: true,
                }),
            },
            Some(70) => flags = tag.as_i32().unwrap_or(0),
            _ => {}
        }
    }

    let points: Vec<Option<Point2>> = vertices.iter().map(PartialVertex::point).collect();
    let mut geometry = connect(&points);
    let closed = flags & 0x01 == 0x01;
    if closed && points.len() >= 2 {
        geometry.push(segment_between(points[points.len() - 1], points[0]));
    }
    geometry
}

/// POLYLINE 头部之后跟随 VERTEX 子实体，直到 SEQEND。
///
/// 游标应位于 `(0, POLYLINE)` 之后；返回时位于 SEQEND 之后，
/// 或停在第一个既非 VERTEX 也非 SEQEND 的组码 0 上。
pub fn parse_polyline(cursor: &mut TagCursor<'_, '_>) -> EntityGeometry {
    // 头部的标志位不参与计算：POLYLINE 一律按开放多段线处理。
    cursor.take_body();

    let mut points: Vec<Option<Point2>> = Vec::new();
    while let Some(tag) = cursor.peek() {
        if tag.is_marker_named("VERTEX") {
            cursor.next();
            let body = cursor.take_body();
            points.push(match (number(body, 10), number(body, 20)) {
                (Some(x), Some(y)) => Some(Point2::new(x, y)),
                _ => None,
            });
        } else if tag.is_marker_named("SEQEND") {
            cursor.next();
            break;
        } else {
            break;
        }
    }
    connect(&points)
}

/// INSERT 本身不产生几何，只记录块名与放置参数。
pub fn parse_insert(body: &[Tag<'_>]) -> Insert {
    let block_name = body
        .iter()
        .rev()
        .find(|tag| tag.has_code(2))
        .map(|tag| tag.value())
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    let transform = InsertTransform::new(
        Point2::new(
            number(body, 10).unwrap_or(0.0),
            number(body, 20).unwrap_or(0.0),
        ),
        Vector2::new(
            number(body, 41).unwrap_or(1.0),
            number(body, 42).unwrap_or(1.0),
        ),
        number(body, 50).unwrap_or(0.0).to_radians(),
    );

    Insert {
        block_name,
        transform,
    }
}

fn connect(points: &[Option<Point2>]) -> EntityGeometry {
    let mut geometry = EntityGeometry::default();
    for pair in points.windows(2) {
        geometry.push(segment_between(pair[0], pair[1]));
    }
    geometry
}

fn segment_between(start: Option<Point2>, end: Option<Point2>) -> Option<Segment> {
    Segment::try_new(start?, end?)
}
