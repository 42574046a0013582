use crate::error::{Result, TransportError};
use crate::Float;
use itertools::izip;
use std::ops::Range;

/// One particle as a row across the phase space arrays.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neutron {
    pub pos: [Float; 3],
    pub dir: [Float; 3],
    pub speed: Float,
    pub time: Float,
    pub cell: usize,
    pub alive: bool,
}

/// The particle population as parallel attribute arrays.
///
/// Every array is allocated at full capacity up front. Only the prefix
/// `[0, logical_count)` holds valid particles; rows past it are scratch.
/// Growing past capacity is an error, never a silent overwrite.
pub struct PhaseSpace {
    pub pos_x: Vec<Float>,
    pub pos_y: Vec<Float>,
    pub pos_z: Vec<Float>,
    pub dir_x: Vec<Float>,
    pub dir_y: Vec<Float>,
    pub dir_z: Vec<Float>,
    pub speed: Vec<Float>,
    pub time: Vec<Float>,
    pub cell: Vec<usize>,
    pub alive: Vec<bool>,
    num_part: usize,
}

impl PhaseSpace {
    pub fn allocate(capacity: usize) -> PhaseSpace {
        PhaseSpace {
            pos_x: vec![0.0; capacity],
            pos_y: vec![0.0; capacity],
            pos_z: vec![0.0; capacity],
            dir_x: vec![0.0; capacity],
            dir_y: vec![0.0; capacity],
            dir_z: vec![0.0; capacity],
            speed: vec![0.0; capacity],
            time: vec![0.0; capacity],
            cell: vec![0; capacity],
            alive: vec![false; capacity],
            num_part: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.alive.len()
    }

    pub fn logical_count(&self) -> usize {
        self.num_part
    }

    pub fn is_empty(&self) -> bool {
        self.num_part == 0
    }

    /// Number of rows in the valid prefix still flagged alive.
    pub fn alive_count(&self) -> usize {
        self.alive[..self.num_part].iter().filter(|&&a| a).count()
    }

    pub fn read_row(&self, i: usize) -> Neutron {
        Neutron {
            pos: [self.pos_x[i], self.pos_y[i], self.pos_z[i]],
            dir: [self.dir_x[i], self.dir_y[i], self.dir_z[i]],
            speed: self.speed[i],
            time: self.time[i],
            cell: self.cell[i],
            alive: self.alive[i],
        }
    }

    pub fn write_row(&mut self, i: usize, n: &Neutron) {
        self.pos_x[i] = n.pos[0];
        self.pos_y[i] = n.pos[1];
        self.pos_z[i] = n.pos[2];
        self.dir_x[i] = n.dir[0];
        self.dir_y[i] = n.dir[1];
        self.dir_z[i] = n.dir[2];
        self.speed[i] = n.speed;
        self.time[i] = n.time;
        self.cell[i] = n.cell;
        self.alive[i] = n.alive;
    }

    /// Claims `extra` rows directly after the valid prefix and extends the
    /// prefix over them. The caller owns the returned range and must fill
    /// every row in it.
    pub fn grow(&mut self, extra: usize) -> Result<Range<usize>> {
        let start = self.num_part;
        let end = match start.checked_add(extra) {
            Some(end) if end <= self.capacity() => end,
            end => {
                return Err(TransportError::CapacityExceeded {
                    requested: end.unwrap_or(usize::MAX),
                    capacity: self.capacity(),
                })
            }
        };
        self.num_part = end;
        Ok(start..end)
    }

    pub fn push(&mut self, n: &Neutron) -> Result<usize> {
        let i = self.grow(1)?.start;
        self.write_row(i, n);
        Ok(i)
    }

    /// Purges dead rows from the valid prefix in one left to right pass.
    /// Survivors keep their relative order; each is copied as a whole row.
    /// Returns the new logical count.
    pub fn compact(&mut self) -> usize {
        let mut kept = 0;
        for i in 0..self.num_part {
            if self.alive[i] {
                if kept != i {
                    let row = self.read_row(i);
                    self.write_row(kept, &row);
                }
                kept += 1;
            }
        }
        self.num_part = kept;
        kept
    }

    /// Largest deviation of |dir| from one over the valid prefix.
    pub fn max_direction_error(&self) -> Float {
        let n = self.num_part;
        izip!(&self.dir_x[..n], &self.dir_y[..n], &self.dir_z[..n])
            .map(|(ux, uy, uz)| ((ux * ux + uy * uy + uz * uz).sqrt() - 1.0).abs())
            .fold(0.0, Float::max)
    }
}
