/// The placement of a layer's box on the canvas: an axis-aligned box in canvas units,
/// then a uniform scale and a rotation, both about the box's center.
///
/// This transform maintains the "Similarity" of shapes and their image, maintaining
/// all angles and the ratios between all lengths.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Frame {
    /// Top-left of the unscaled, unrotated box, in canvas units. 0,0 is top left, +X Right, +Y down.
    pub origin: [f32; 2],
    /// Unscaled size of the box.
    pub size: [f32; 2],
    pub scale: f32,
    /// Rotation in degrees, *CW* on screen.
    pub rotation_degrees: f32,
}
impl Frame {
    #[must_use]
    pub fn center(&self) -> [f32; 2] {
        [
            self.origin[0] + self.size[0] / 2.0,
            self.origin[1] + self.size[1] / 2.0,
        ]
    }
    /// Size after scaling, as seen on the canvas.
    #[must_use]
    pub fn effective_size(&self) -> [f32; 2] {
        [self.size[0] * self.scale, self.size[1] * self.scale]
    }
    /// Transform from box-local space (`[0, size]`) into canvas space.
    #[must_use]
    pub fn local_to_canvas(&self) -> Matrix {
        let [cx, cy] = self.center();
        let [half_w, half_h] = [self.size[0] / 2.0, self.size[1] / 2.0];
        let (sin, cos) = self.rotation_degrees.to_radians().sin_cos();
        let a = cos * self.scale;
        let b = sin * self.scale;
        let c = -sin * self.scale;
        let d = cos * self.scale;
        // Move the center of the box onto the canvas-space center after scale+rotate.
        Matrix {
            elements: [
                [a, b],
                [c, d],
                [cx - (a * half_w + c * half_h), cy - (b * half_w + d * half_h)],
            ],
        }
    }
    /// Bring a canvas point into box-local space. `None` if the frame is degenerate.
    #[must_use]
    pub fn canvas_to_local(&self, point: [f32; 2]) -> Option<[f32; 2]> {
        Some(self.local_to_canvas().invert()?.transform_point(point))
    }
    /// Hit test against the rotated box. Uses the inverse-rotated point, so it stays exact
    /// for any rotation.
    #[must_use]
    pub fn contains(&self, point: [f32; 2]) -> bool {
        self.canvas_to_local(point).is_some_and(|[x, y]| {
            (0.0..=self.size[0]).contains(&x) && (0.0..=self.size[1]).contains(&y)
        })
    }
    /// Canvas-space corners, in the order of [`Corner::ALL`].
    #[must_use]
    pub fn corners(&self) -> [[f32; 2]; 4] {
        let m = self.local_to_canvas();
        Corner::ALL.map(|corner| m.transform_point(corner.local(self.size)))
    }
    #[must_use]
    pub fn corner(&self, corner: Corner) -> [f32; 2] {
        self.local_to_canvas()
            .transform_point(corner.local(self.size))
    }
}

/// A corner of a layer's box, named as it would be with no rotation applied.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, strum::EnumIter)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}
impl Corner {
    pub const ALL: [Self; 4] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomRight,
        Self::BottomLeft,
    ];
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::TopLeft => Self::BottomRight,
            Self::TopRight => Self::BottomLeft,
            Self::BottomRight => Self::TopLeft,
            Self::BottomLeft => Self::TopRight,
        }
    }
    /// Position within a box of the given size, in box-local space.
    #[must_use]
    pub fn local(self, size: [f32; 2]) -> [f32; 2] {
        match self {
            Self::TopLeft => [0.0, 0.0],
            Self::TopRight => [size[0], 0.0],
            Self::BottomRight => [size[0], size[1]],
            Self::BottomLeft => [0.0, size[1]],
        }
    }
    /// Unit direction pointing from the opposite corner towards this one, in box-local space.
    #[must_use]
    pub fn outward(self) -> [f32; 2] {
        match self {
            Self::TopLeft => [-1.0, -1.0],
            Self::TopRight => [1.0, -1.0],
            Self::BottomRight => [1.0, 1.0],
            Self::BottomLeft => [-1.0, 1.0],
        }
    }
}

/// An arbitrary 2D affine transform.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Matrix {
    /// Column-major matrix elements
    pub elements: [[f32; 2]; 3],
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Self = Self {
        elements: [[1.0, 0.0], [0.0, 1.0], [0.0, 0.0]],
    };
    #[must_use]
    pub fn transform_point(&self, [x, y]: [f32; 2]) -> [f32; 2] {
        let [[a, b], [c, d], [tx, ty]] = self.elements;
        [a * x + c * y + tx, b * x + d * y + ty]
    }
    /// Inverse transform, or `None` if the matrix is singular (zero scale).
    #[must_use]
    pub fn invert(&self) -> Option<Self> {
        let [[a, b], [c, d], [tx, ty]] = self.elements;
        let det = a * d - b * c;
        if det.abs() <= f32::EPSILON * f32::EPSILON || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;
        let (ia, ib, ic, id) = (d * inv, -b * inv, -c * inv, a * inv);
        Some(Self {
            elements: [
                [ia, ib],
                [ic, id],
                [-(ia * tx + ic * ty), -(ib * tx + id * ty)],
            ],
        })
    }
}

impl From<[[f32; 2]; 3]> for Matrix {
    fn from(elements: [[f32; 2]; 3]) -> Self {
        Self { elements }
    }
}

impl From<Matrix> for [[f32; 2]; 3] {
    fn from(value: Matrix) -> Self {
        value.elements
    }
}
