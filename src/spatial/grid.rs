//! Generic dense grid over integer cells

use crate::core::error::{Result, SimError};
use crate::core::types::Position;

/// Generic 2D grid, row-major, fixed size after construction
#[derive(Debug, Clone)]
pub struct Grid<T: Clone + Default> {
    width: i32,
    height: i32,
    data: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            data: vec![T::default(); (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    /// Row-major index of an in-bounds cell
    #[inline]
    pub fn index(&self, x: i32, y: i32) -> Result<usize> {
        if self.contains(x, y) {
            Ok((y as usize) * (self.width as usize) + x as usize)
        } else {
            Err(SimError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Cell for a row-major index
    #[inline]
    pub fn position_of(&self, index: usize) -> Position {
        let w = self.width as usize;
        Position::new((index % w) as i32, (index / w) as i32)
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Result<&T> {
        let idx = self.index(x, y)?;
        Ok(&self.data[idx])
    }

    #[inline]
    pub fn get_mut(&mut self, x: i32, y: i32) -> Result<&mut T> {
        let idx = self.index(x, y)?;
        Ok(&mut self.data[idx])
    }

    #[inline]
    pub fn set(&mut self, x: i32, y: i32, value: T) -> Result<()> {
        *self.get_mut(x, y)? = value;
        Ok(())
    }

    /// All cells within Manhattan `radius` of `center`, clipped to the grid,
    /// in ascending `(x, y)` order
    pub fn cells_within(&self, center: Position, radius: i32) -> impl Iterator<Item = Position> + '_ {
        let radius = radius.max(0);
        let x_lo = center.x.saturating_sub(radius).max(0);
        let x_hi = center.x.saturating_add(radius).min(self.width - 1);
        (x_lo..=x_hi).flat_map(move |x| {
            let budget = radius - (x - center.x).abs();
            let y_lo = center.y.saturating_sub(budget).max(0);
            let y_hi = center.y.saturating_add(budget).min(self.height - 1);
            (y_lo..=y_hi).map(move |y| Position::new(x, y))
        })
    }
}
