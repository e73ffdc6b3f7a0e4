#[derive(Debug,Clone,Copy,PartialEq)]
pub struct Point<T> where T: PartialOrd + PartialEq {
    pub x: T,
    pub y: T
}

impl<T> Point<T> where T: PartialOrd + PartialEq {
    pub fn new(x: T, y:T) -> Point<T> {
        Point{x,y}
    }
}
