use hashbrown::HashSet;

/// One occupied lattice cell. `color` is a palette index carried for callers; geometry ignores it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Voxel {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub color: u8,
}

impl Voxel {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z, color: 0 }
    }

    #[inline]
    pub const fn with_color(x: i32, y: i32, z: i32, color: u8) -> Self {
        Self { x, y, z, color }
    }

    #[inline]
    pub const fn coord(&self) -> (i32, i32, i32) {
        (self.x, self.y, self.z)
    }
}

/// Inclusive integer extrema over a set of cells.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub min: (i32, i32, i32),
    pub max: (i32, i32, i32),
}

impl BoundingBox {
    #[inline]
    pub const fn new(min: (i32, i32, i32), max: (i32, i32, i32)) -> Self {
        Self { min, max }
    }

    /// Box covering `[0, dims)` on each axis. `dims` must be non-zero.
    pub fn from_dims(dims: (usize, usize, usize)) -> Self {
        Self {
            min: (0, 0, 0),
            max: (dims.0 as i32 - 1, dims.1 as i32 - 1, dims.2 as i32 - 1),
        }
    }

    pub fn from_cells(cells: impl IntoIterator<Item = (i32, i32, i32)>) -> Option<Self> {
        let mut it = cells.into_iter();
        let first = it.next()?;
        let mut b = BoundingBox::new(first, first);
        for c in it {
            b.include(c);
        }
        Some(b)
    }

    #[inline]
    pub fn include(&mut self, (x, y, z): (i32, i32, i32)) {
        self.min = (self.min.0.min(x), self.min.1.min(y), self.min.2.min(z));
        self.max = (self.max.0.max(x), self.max.1.max(y), self.max.2.max(z));
    }

    /// Grows the box by `n` cells on every side.
    #[inline]
    pub fn expanded(&self, n: i32) -> Self {
        Self {
            min: (self.min.0 - n, self.min.1 - n, self.min.2 - n),
            max: (self.max.0 + n, self.max.1 + n, self.max.2 + n),
        }
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize, usize) {
        (
            (self.max.0 - self.min.0 + 1) as usize,
            (self.max.1 - self.min.1 + 1) as usize,
            (self.max.2 - self.min.2 + 1) as usize,
        )
    }

    #[inline]
    pub fn contains(&self, (x, y, z): (i32, i32, i32)) -> bool {
        x >= self.min.0
            && x <= self.max.0
            && y >= self.min.1
            && y <= self.max.1
            && z >= self.min.2
            && z <= self.max.2
    }
}

/// Unordered voxel collection with coordinate membership. A later insert at an
/// occupied coordinate is ignored.
#[derive(Clone, Debug, Default)]
pub struct VoxelSet {
    voxels: Vec<Voxel>,
    index: HashSet<(i32, i32, i32)>,
}

impl VoxelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            voxels: Vec::with_capacity(n),
            index: HashSet::with_capacity(n),
        }
    }

    /// Returns `false` when a voxel already occupies that coordinate.
    pub fn insert(&mut self, v: Voxel) -> bool {
        if !self.index.insert(v.coord()) {
            return false;
        }
        self.voxels.push(v);
        true
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        self.index.contains(&(x, y, z))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Voxel> {
        self.voxels.iter()
    }

    pub fn as_slice(&self) -> &[Voxel] {
        &self.voxels
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_cells(self.voxels.iter().map(Voxel::coord))
    }
}

impl FromIterator<Voxel> for VoxelSet {
    fn from_iter<I: IntoIterator<Item = Voxel>>(iter: I) -> Self {
        let mut set = VoxelSet::new();
        for v in iter {
            set.insert(v);
        }
        set
    }
}

impl<'a> IntoIterator for &'a VoxelSet {
    type Item = &'a Voxel;
    type IntoIter = std::slice::Iter<'a, Voxel>;
    fn into_iter(self) -> Self::IntoIter {
        self.voxels.iter()
    }
}
