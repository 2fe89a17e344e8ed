use std::sync::atomic::{AtomicUsize, Ordering};

use reflecta::{Upcast, reflect_class};

#[derive(Clone, Debug, PartialEq)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}
reflect_class!(Vec2: Clone, PartialEq, Debug);

impl Vec2 {
    pub fn new(x: i32, y: i32) -> Self {
        Vec2 { x, y }
    }

    pub fn dot(&self, other: Vec2) -> i32 {
        self.x * other.x + self.y * other.y
    }

    pub fn scale(&mut self, by: i32) {
        self.x *= by;
        self.y *= by;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    pub id: u32,
}
reflect_class!(Shape: Clone, PartialEq, Debug);

#[derive(Clone, Debug, PartialEq)]
pub struct Circle {
    pub shape: Shape,
    pub radius: f64,
}
reflect_class!(Circle: Clone, PartialEq, Debug);

impl Upcast<Shape> for Circle {
    fn upcast(&self) -> &Shape {
        &self.shape
    }

    fn upcast_mut(&mut self) -> &mut Shape {
        &mut self.shape
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub text: String,
}
reflect_class!(Label: Clone, PartialEq, Debug);

impl Label {
    pub fn new(text: &str) -> Self {
        Label { text: text.to_owned() }
    }

    pub fn text(&self) -> &String {
        &self.text
    }

    pub fn text_mut(&mut self) -> &mut String {
        &mut self.text
    }

    pub fn longer_than(&self, other: &Label) -> bool {
        self.text.len() > other.text.len()
    }
}

/// Not cloneable once erased.
pub struct Opaque;
reflect_class!(Opaque);

/// Counts its live instances in [`LIVE`]; only the placement test uses it.
pub struct Tracked {
    pub value: i32,
}
reflect_class!(Tracked: Clone);

pub static LIVE: AtomicUsize = AtomicUsize::new(0);

pub fn live() -> usize {
    LIVE.load(Ordering::SeqCst)
}

impl Tracked {
    pub fn new(value: i32) -> Self {
        LIVE.fetch_add(1, Ordering::SeqCst);
        Tracked { value }
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        Tracked::new(self.value)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        LIVE.fetch_sub(1, Ordering::SeqCst);
    }
}
