use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Monitor {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Monitor {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementOptions {
    /// Monitor index; random when unset or out of range.
    pub monitor: Option<usize>,
    /// Cow position relative to the monitor origin; random when unset.
    pub cow_at: Option<(i32, i32)>,
    /// Extra offset applied to the bubble after it is placed next to the cow.
    pub bubble_offset: (i32, i32),
    /// Horizontal space between cow and bubble.
    pub gap: u32,
    /// Put the bubble on the left of the cow.
    pub left: bool,
}

impl Default for PlacementOptions {
    fn default() -> Self {
        Self {
            monitor: None,
            cow_at: None,
            bubble_offset: (0, 0),
            gap: 5,
            left: false,
        }
    }
}

/// Absolute screen positions for the two shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub cow: (i32, i32),
    pub bubble: (i32, i32),
}

pub fn choose_monitor<'a, R: Rng + ?Sized>(
    monitors: &'a [Monitor],
    requested: Option<usize>,
    rng: &mut R,
) -> Option<&'a Monitor> {
    if monitors.is_empty() {
        return None;
    }
    if let Some(idx) = requested {
        if let Some(monitor) = monitors.get(idx) {
            return Some(monitor);
        }
        tracing::warn!(
            "Monitor {} does not exist ({} available), picking one at random",
            idx,
            monitors.len()
        );
    }
    monitors.get(rng.gen_range(0..monitors.len()))
}

/// Pick positions for the cow and its bubble on `monitor`.
///
/// The cow lands inside the area left over once the pair's combined
/// footprint is removed from the monitor, so as long as the cow itself fits
/// it is never placed off screen.
pub fn place<R: Rng + ?Sized>(
    monitor: &Monitor,
    cow: Size,
    bubble: Size,
    opts: &PlacementOptions,
    rng: &mut R,
) -> Placement {
    let (mon_w, mon_h) = (monitor.width as i64, monitor.height as i64);
    let (cow_w, cow_h) = (cow.width as i64, cow.height as i64);
    let (bubble_w, bubble_h) = (bubble.width as i64, bubble.height as i64);
    let gap = opts.gap as i64;

    let total_w = cow_w + gap + bubble_w;
    let total_h = cow_h.max(bubble_h);
    let bubble_off = ((bubble_h - cow_h) / 2).max(0);

    // Never let the random range collapse to nothing
    let area_w = (mon_w - total_w).max(1);
    let area_h = (mon_h - total_h).max(1);

    let (mut x, y) = match opts.cow_at {
        Some((x, y)) => (
            (x as i64).clamp(0, area_w - 1),
            (y as i64).clamp(0, area_h - 1),
        ),
        None => (rng.gen_range(0..area_w), rng.gen_range(0..area_h)),
    };
    let y = (y + bubble_off).min((mon_h - cow_h).max(0));

    if opts.left {
        x = (x + bubble_w + gap).min((mon_w - cow_w).max(0));
    }

    let bubble_x = if opts.left {
        x - gap - bubble_w
    } else {
        x + cow_w + gap
    };
    let bubble_y = y + (cow_h - bubble_h) / 2;

    let (dx, dy) = opts.bubble_offset;
    Placement {
        cow: (to_screen(monitor.x, x), to_screen(monitor.y, y)),
        bubble: (
            to_screen(monitor.x, bubble_x + dx as i64),
            to_screen(monitor.y, bubble_y + dy as i64),
        ),
    }
}

fn to_screen(origin: i32, local: i64) -> i32 {
    (origin as i64 + local).clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
