//! Layout geometry reported by the renderer.
//!
//! Coordinates are in host pixels with `y` growing downwards. The engine
//! never computes layout; it only reads the last `BoardLayout` it was given.

use crate::model::item::ItemId;
use crate::model::tier::TierId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// True when both rectangles share a non-empty area.
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Rectangles of bucket containers and item cards from the last render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardLayout {
    buckets: HashMap<TierId, Rect>,
    items: HashMap<ItemId, Rect>,
}

impl BoardLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket(mut self, tier: TierId, rect: Rect) -> Self {
        self.set_bucket(tier, rect);
        self
    }

    pub fn with_item(mut self, id: ItemId, rect: Rect) -> Self {
        self.set_item(id, rect);
        self
    }

    pub fn set_bucket(&mut self, tier: TierId, rect: Rect) {
        self.buckets.insert(tier, rect);
    }

    pub fn set_item(&mut self, id: ItemId, rect: Rect) {
        self.items.insert(id, rect);
    }

    pub fn bucket_rect(&self, tier: TierId) -> Option<Rect> {
        self.buckets.get(&tier).copied()
    }

    pub fn item_rect(&self, id: ItemId) -> Option<Rect> {
        self.items.get(&id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty() && self.items.is_empty()
    }
}
