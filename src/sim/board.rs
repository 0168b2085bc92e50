//! Board geometry: staggered peg rows, slot layout and drop zones
//!
//! Coordinates are screen pixels with y pointing down. Slots span the full
//! board width, so the slot under any x is `floor(x / slot_width)`.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::settings::{BoardConfig, ConfigError, PhysicsConfig};

/// Stable peg identity (`row-col`), used as the cooldown map key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PegKey {
    pub row: u32,
    pub col: u32,
}

impl fmt::Display for PegKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.row, self.col)
    }
}

/// A static peg
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peg {
    pub row: u32,
    pub col: u32,
    pub pos: Vec2,
}

impl Peg {
    #[inline]
    pub fn key(&self) -> PegKey {
        PegKey {
            row: self.row,
            col: self.col,
        }
    }
}

/// A horizontal region of the top of the board the player may drop from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DropZone {
    pub index: usize,
    /// Leftmost allowed ball centre
    pub min_x: f32,
    /// Rightmost allowed ball centre
    pub max_x: f32,
}

impl DropZone {
    pub fn center(&self) -> f32 {
        (self.min_x + self.max_x) * 0.5
    }

    pub fn contains(&self, x: f32) -> bool {
        x >= self.min_x && x <= self.max_x
    }
}

/// Fully laid out board, built once per configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub config: BoardConfig,
    /// Pegs in row-major order
    pub pegs: Vec<Peg>,
    pub slot_width: f32,
    /// Top of the slot dividers; the ball is "in the bucket" below this line
    pub bucket_zone_y: f32,
    pub bucket_floor_y: f32,
    /// y of the first and last peg rows
    pub peg_top_y: f32,
    pub peg_bottom_y: f32,
    pub row_spacing: f32,
    /// Ball centre height at the start of a drop
    pub drop_y: f32,
    pub border_width: f32,
    pub bucket_wall_width: f32,
    pub ball_radius: f32,
    pub peg_radius: f32,
}

impl Board {
    /// Lay out pegs and slots for a board configuration
    ///
    /// Even rows hold one peg above every slot centre; odd rows are shifted by
    /// half a spacing onto the slot boundaries and hold one fewer peg, so a
    /// centrally dropped ball always meets a peg under each gap.
    pub fn layout(config: &BoardConfig, physics: &PhysicsConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        physics.validate()?;

        let width = config.board_width;
        let height = config.board_height;
        let slots = config.slot_count;
        let ball_r = physics.ball_radius;
        let peg_r = physics.peg_radius;
        let border = physics.border_width;

        let slot_width = width / slots as f32;
        let required = 2.0 * ball_r + physics.bucket_wall_width + 1.0;
        if slot_width < required {
            return Err(ConfigError::SlotTooNarrow {
                slot_width,
                required,
            });
        }
        // Outer slots lose the board wall instead of half a divider
        let outer_width = if slots == 1 {
            slot_width - 2.0 * border
        } else {
            slot_width - border - physics.bucket_wall_width * 0.5
        };
        if outer_width < 2.0 * ball_r + 1.0 {
            return Err(ConfigError::SlotTooNarrow {
                slot_width: outer_width,
                required: 2.0 * ball_r + 1.0,
            });
        }

        let bucket_floor_y = height - border;
        let bucket_height = (height * 0.14).max(ball_r * 4.0);
        let bucket_zone_y = bucket_floor_y - bucket_height;

        // Keep a ball-sized gap between the last row and the slot dividers
        let peg_top_y = (height * 0.12).max(ball_r * 4.0 + peg_r);
        let peg_bottom_y = bucket_zone_y - (peg_r + 2.0 * ball_r + 4.0);
        let rows = config.peg_rows;
        let row_spacing = if rows > 1 {
            (peg_bottom_y - peg_top_y) / (rows - 1) as f32
        } else {
            0.0
        };
        if peg_bottom_y <= peg_top_y && rows > 1 {
            return Err(ConfigError::BoardTooCramped {
                reason: format!(
                    "{} rows do not fit between y={:.1} and y={:.1}",
                    rows, peg_top_y, peg_bottom_y
                ),
            });
        }

        // Diagonal neighbours (half a slot across, one row down) and the peg
        // two rows below must leave room for the ball to pass
        if rows > 1 {
            let diagonal = Vec2::new(slot_width * 0.5, row_spacing).length();
            let vertical = 2.0 * row_spacing;
            if diagonal.min(vertical) - 2.0 * peg_r <= 2.0 * ball_r {
                return Err(ConfigError::BoardTooCramped {
                    reason: format!(
                        "peg gap {:.1} is narrower than the ball",
                        diagonal.min(vertical) - 2.0 * peg_r
                    ),
                });
            }
        }

        // Pegs stay far enough from the walls for the ball to slip past
        let wall_clearance = border + peg_r + 2.0 * ball_r + 1.0;
        let min_peg_x = wall_clearance;
        let max_peg_x = width - wall_clearance;
        if min_peg_x > max_peg_x {
            return Err(ConfigError::BoardTooCramped {
                reason: format!("board width {:.1} leaves no room for pegs", width),
            });
        }

        let mut pegs = Vec::new();
        for row in 0..rows {
            let y = peg_top_y + row as f32 * row_spacing;
            let odd = row % 2 == 1;
            let count = if odd { slots - 1 } else { slots };
            let mut last_x: Option<f32> = None;
            for col in 0..count {
                let x = if odd {
                    (col + 1) as f32 * slot_width
                } else {
                    (col as f32 + 0.5) * slot_width
                };
                let x = x.clamp(min_peg_x, max_peg_x);
                if let Some(prev) = last_x {
                    if x - prev - 2.0 * peg_r <= 2.0 * ball_r {
                        return Err(ConfigError::BoardTooCramped {
                            reason: format!("pegs in row {} are too close after wall clearance", row),
                        });
                    }
                }
                last_x = Some(x);
                pegs.push(Peg {
                    row,
                    col,
                    pos: Vec2::new(x, y),
                });
            }
        }

        let drop_y = (peg_top_y * 0.5).max(ball_r + 1.0);

        log::debug!(
            "Board {}x{}: {} pegs in {} rows, {} slots of {:.1}px, bucket at y={:.1}",
            width,
            height,
            pegs.len(),
            rows,
            slots,
            slot_width,
            bucket_zone_y
        );

        Ok(Self {
            config: *config,
            pegs,
            slot_width,
            bucket_zone_y,
            bucket_floor_y,
            peg_top_y,
            peg_bottom_y,
            row_spacing,
            drop_y,
            border_width: border,
            bucket_wall_width: physics.bucket_wall_width,
            ball_radius: ball_r,
            peg_radius: peg_r,
        })
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.config.board_width
    }

    #[inline]
    pub fn slot_count(&self) -> usize {
        self.config.slot_count as usize
    }

    /// Ball radius + peg radius
    #[inline]
    pub fn collision_radius(&self) -> f32 {
        self.ball_radius + self.peg_radius
    }

    /// Leftmost ball centre allowed by the board wall
    #[inline]
    pub fn min_x(&self) -> f32 {
        self.border_width + self.ball_radius
    }

    /// Rightmost ball centre allowed by the board wall
    #[inline]
    pub fn max_x(&self) -> f32 {
        self.width() - self.border_width - self.ball_radius
    }

    #[inline]
    pub fn in_bucket_zone(&self, y: f32) -> bool {
        y >= self.bucket_zone_y
    }

    /// Slot index under `x`, clamped to the board
    pub fn slot_at(&self, x: f32) -> usize {
        let raw = (x / self.slot_width).floor();
        if raw <= 0.0 {
            0
        } else {
            (raw as usize).min(self.slot_count() - 1)
        }
    }

    pub fn slot_center(&self, slot: usize) -> f32 {
        (slot as f32 + 0.5) * self.slot_width
    }

    /// Inner faces of a slot's walls (left, right)
    ///
    /// Outer slots use the board wall; inner slots use half a divider.
    pub fn slot_walls(&self, slot: usize) -> (f32, f32) {
        let half_wall = self.bucket_wall_width * 0.5;
        let left = if slot == 0 {
            self.border_width
        } else {
            slot as f32 * self.slot_width + half_wall
        };
        let right = if slot + 1 >= self.slot_count() {
            self.width() - self.border_width
        } else {
            (slot + 1) as f32 * self.slot_width - half_wall
        };
        (left, right)
    }

    /// Split the playable width into `count` equal drop zones
    pub fn drop_zones(&self, count: usize) -> Vec<DropZone> {
        let count = count.max(1);
        let span = (self.max_x() - self.min_x()) / count as f32;
        (0..count)
            .map(|index| DropZone {
                index,
                min_x: self.min_x() + index as f32 * span,
                max_x: self.min_x() + (index + 1) as f32 * span,
            })
            .collect()
    }

    pub fn peg(&self, key: PegKey) -> Option<&Peg> {
        self.pegs.iter().find(|p| p.key() == key)
    }
}
