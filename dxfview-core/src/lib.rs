pub mod geometry {
    use glam::{DAffine2, DVec2};
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示，保持双精度。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn is_finite(self) -> bool {
            self.0.is_finite()
        }

        #[inline]
        pub fn distance(self, other: Point2) -> f64 {
            self.0.distance(other.0)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    /// 二维向量，目前主要承载 INSERT 的缩放系数。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    /// 轴对齐边界框，用于估算图纸范围。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        #[inline]
        pub fn width(&self) -> f64 {
            self.max.x() - self.min.x()
        }

        #[inline]
        pub fn height(&self) -> f64 {
            self.max.y() - self.min.y()
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            let min_vec = self.min.as_vec2().min(point.as_vec2());
            let max_vec = self.max.as_vec2().max(point.as_vec2());
            self.min = Point2::from_vec(min_vec);
            self.max = Point2::from_vec(max_vec);
        }

        #[inline]
        pub fn center(&self) -> Point2 {
            debug_assert!(!self.is_empty());
            let center = (self.min.as_vec2() + self.max.as_vec2()) * 0.5;
            Point2::from_vec(center)
        }
    }

    /// INSERT 的放置参数：先缩放、再旋转、最后平移。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct InsertTransform {
        pub position: Point2,
        pub scale: Vector2,
        /// 旋转角（弧度）。
        pub rotation: f64,
    }

    impl InsertTransform {
        #[inline]
        pub fn new(position: Point2, scale: Vector2, rotation: f64) -> Self {
            Self {
                position,
                scale,
                rotation,
            }
        }

        /// `translation * rotation * scale`，与 DXF INSERT 的组合顺序一致。
        #[inline]
        pub fn to_affine(&self) -> DAffine2 {
            DAffine2::from_scale_angle_translation(
                self.scale.as_vec2(),
                self.rotation,
                self.position.as_vec2(),
            )
        }

        #[inline]
        pub fn apply(&self, point: Point2) -> Point2 {
            Point2::from_vec(self.to_affine().transform_point2(point.as_vec2()))
        }
    }

    impl Default for InsertTransform {
        fn default() -> Self {
            Self {
                position: Point2::new(0.0, 0.0),
                scale: Vector2::new(1.0, 1.0),
                rotation: 0.0,
            }
        }
    }

    /// 有向线段。四个坐标均为有限值，构造后不可变。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize)]
    pub struct Segment {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    }

    impl Segment {
        /// 任一坐标非有限值（NaN/∞）时返回 `None`。
        pub fn try_new(start: Point2, end: Point2) -> Option<Self> {
            if !start.is_finite() || !end.is_finite() {
                return None;
            }
            Some(Self {
                x1: start.x(),
                y1: start.y(),
                x2: end.x(),
                y2: end.y(),
            })
        }

        #[inline]
        pub fn start(&self) -> Point2 {
            Point2::new(self.x1, self.y1)
        }

        #[inline]
        pub fn end(&self) -> Point2 {
            Point2::new(self.x2, self.y2)
        }

        #[inline]
        pub fn coords(&self) -> [f64; 4] {
            [self.x1, self.y1, self.x2, self.y2]
        }

        #[inline]
        pub fn length(&self) -> f64 {
            self.start().distance(self.end())
        }

        /// 对两个端点分别应用仿射变换；结果溢出为非有限值时返回 `None`。
        pub fn transformed(&self, affine: &DAffine2) -> Option<Self> {
            let start = affine.transform_point2(self.start().as_vec2());
            let end = affine.transform_point2(self.end().as_vec2());
            Self::try_new(Point2::from_vec(start), Point2::from_vec(end))
        }
    }

}

pub mod drawing {
    use serde::Serialize;

    use crate::geometry::{Bounds2D, Segment};

    /// 解析结果：按实体出现顺序排列的扁平线段列表，供外部渲染器直接描边。
    #[derive(Debug, Clone, Default, PartialEq, Serialize)]
    pub struct Drawing {
        segments: Vec<Segment>,
    }

    impl Drawing {
        pub fn new() -> Self {
            Self::default()
        }

        #[inline]
        pub fn push(&mut self, segment: Segment) {
            self.segments.push(segment);
        }

        #[inline]
        pub fn segments(&self) -> &[Segment] {
            &self.segments
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.segments.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.segments.is_empty()
        }

        /// 所有端点的包围盒；空图纸返回 `None`。
        pub fn bounds(&self) -> Option<Bounds2D> {
            if self.segments.is_empty() {
                return None;
            }
            let mut bounds = Bounds2D::empty();
            for segment in &self.segments {
                bounds.include_point(segment.start());
                bounds.include_point(segment.end());
            }
            Some(bounds)
        }
    }

    impl Extend<Segment> for Drawing {
        fn extend<I: IntoIterator<Item = Segment>>(&mut self, iter: I) {
            self.segments.extend(iter);
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::geometry::Point2;

        #[test]
        fn drawing_bounds_cover_all_endpoints() {
            let mut drawing = Drawing::new();
            assert!(drawing.bounds().is_none());

            drawing.extend([
                Segment::try_new(Point2::new(0.0, 0.0), Point2::new(5.0, 0.0)),
                Segment::try_new(Point2::new(-1.0, 2.0), Point2::new(3.0, 7.5)),
            ]
            .into_iter()
            .flatten());

            assert_eq!(drawing.len(), 2);
            let bounds = drawing.bounds().expect("bounds should exist");
            assert_eq!(bounds.min(), Point2::new(-1.0, 0.0));
            assert_eq!(bounds.max(), Point2::new(5.0, 7.5));
        }
    }
}
