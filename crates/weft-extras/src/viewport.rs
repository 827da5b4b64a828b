#![forbid(unsafe_code)]

//! Viewport culling: which objects overlap the visible rectangle?
//!
//! For scrollable containers holding thousands of children, a linear
//! overlap scan per frame is the bottleneck. When the child list is sorted
//! by primary-axis start (`y` for a column, `x` for a row), a binary search
//! lands on one overlapping candidate and a bounded expansion in both
//! directions collects the rest.
//!
//! The leftward expansion tolerates a run of non-overlapping elements
//! ([`CullerConfig::max_look_behind`]): sorted-by-start order says nothing
//! about ends, so a tall/wide object can begin far before the viewport
//! with many small objects between it and the visible range.
//!
//! Survivors are stable-sorted by ascending `z_index`, ready for painter's
//! algorithm rendering.

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The visible rectangle, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in cells.
    pub width: i32,
    /// Height in cells.
    pub height: i32,
}

impl Viewport {
    /// Create a viewport rectangle.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Grow the rectangle by `padding` on every side.
    #[must_use]
    const fn expanded(self, padding: i32) -> Self {
        Self {
            x: self.x - padding,
            y: self.y - padding,
            width: self.width + 2 * padding,
            height: self.height + 2 * padding,
        }
    }
}

/// An object that can be culled against a viewport.
pub trait Cullable {
    /// Left edge.
    fn x(&self) -> i32;

    /// Top edge.
    fn y(&self) -> i32;

    /// Width in cells.
    fn width(&self) -> i32;

    /// Height in cells.
    fn height(&self) -> i32;

    /// Paint order; higher paints later.
    fn z_index(&self) -> i32 {
        0
    }
}

/// Scroll direction of the container, which fixes the primary axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAxis {
    /// Vertical scrolling; the primary axis is `y`.
    Column,
    /// Horizontal scrolling; the primary axis is `x`.
    Row,
}

/// Tuning parameters for the culler.
#[derive(Debug, Clone)]
pub struct CullerConfig {
    /// Cells of slack around the viewport. Default: 10.
    pub padding: i32,

    /// Below this object count the scan is linear (the input is returned
    /// unchanged). Default: 16.
    pub min_trigger_size: usize,

    /// How many consecutive primary-axis misses the leftward expansion
    /// tolerates before stopping. Default: 50.
    pub max_look_behind: usize,
}

impl Default for CullerConfig {
    fn default() -> Self {
        Self {
            padding: 10,
            min_trigger_size: 16,
            max_look_behind: 50,
        }
    }
}

// ---------------------------------------------------------------------------
// Culling
// ---------------------------------------------------------------------------

/// Half-open interval overlap.
const fn overlaps(a_start: i32, a_end: i32, b_start: i32, b_end: i32) -> bool {
    a_start < b_end && b_start < a_end
}

fn primary_interval<T: Cullable>(object: &T, axis: ScrollAxis) -> (i32, i32) {
    match axis {
        ScrollAxis::Column => (object.y(), object.y() + object.height()),
        ScrollAxis::Row => (object.x(), object.x() + object.width()),
    }
}

fn cross_interval<T: Cullable>(object: &T, axis: ScrollAxis) -> (i32, i32) {
    match axis {
        ScrollAxis::Column => (object.x(), object.x() + object.width()),
        ScrollAxis::Row => (object.y(), object.y() + object.height()),
    }
}

/// Return the objects overlapping `viewport` expanded by the configured
/// padding, sorted by ascending `z_index`.
///
/// `objects` must be pre-sorted by primary-axis start once it reaches
/// [`CullerConfig::min_trigger_size`]; behaviour on unsorted input is
/// undefined. Shorter inputs are returned unchanged. An invalid viewport
/// (negative size) or an empty input yields an empty result.
pub fn objects_in_viewport<'a, T: Cullable>(
    viewport: Viewport,
    objects: &'a [T],
    axis: ScrollAxis,
    config: &CullerConfig,
) -> Vec<&'a T> {
    if objects.is_empty() || viewport.width < 0 || viewport.height < 0 {
        return Vec::new();
    }
    if objects.len() < config.min_trigger_size {
        return objects.iter().collect();
    }

    let view = viewport.expanded(config.padding);
    let (vp_start, vp_end) = match axis {
        ScrollAxis::Column => (view.y, view.y + view.height),
        ScrollAxis::Row => (view.x, view.x + view.width),
    };
    let (vc_start, vc_end) = match axis {
        ScrollAxis::Column => (view.x, view.x + view.width),
        ScrollAxis::Row => (view.y, view.y + view.height),
    };

    // Binary search for any primary-overlapping element.
    let mut lo = 0;
    let mut hi = objects.len();
    let mut candidate = None;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let (start, end) = primary_interval(&objects[mid], axis);
        if end <= vp_start {
            lo = mid + 1;
        } else if start >= vp_end {
            hi = mid;
        } else {
            candidate = Some(mid);
            break;
        }
    }
    let Some(candidate) = candidate else {
        return Vec::new();
    };

    let mut indices = Vec::new();

    // Rightward: sorted-by-start guarantees termination once starts pass
    // the viewport end.
    for (offset, object) in objects[candidate..].iter().enumerate() {
        let (start, end) = primary_interval(object, axis);
        if start >= vp_end {
            break;
        }
        if overlaps(start, end, vp_start, vp_end) {
            indices.push(candidate + offset);
        }
    }

    // Leftward: bounded tolerance for runs of short objects sitting between
    // a tall early-starting object and the viewport.
    let mut misses = 0;
    let mut index = candidate;
    while index > 0 && misses < config.max_look_behind {
        index -= 1;
        let (start, end) = primary_interval(&objects[index], axis);
        if overlaps(start, end, vp_start, vp_end) {
            indices.push(index);
            misses = 0;
        } else {
            misses += 1;
        }
    }

    indices.sort_unstable();
    let mut survivors: Vec<&T> = indices
        .into_iter()
        .map(|i| &objects[i])
        .filter(|object| {
            let (start, end) = cross_interval(*object, axis);
            overlaps(start, end, vc_start, vc_end)
        })
        .collect();
    survivors.sort_by_key(|object| object.z_index());
    survivors
}
