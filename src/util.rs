use ratatui::layout::Rect;

pub fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Rate of resolved thoughts per minute for a session of the given length
pub fn pace_per_min(resolved: u32, duration_secs: u32) -> u32 {
    if duration_secs == 0 {
        return 0;
    }
    (resolved as f64 / (duration_secs as f64 / 60.0)).round() as u32
}

/// Rect of `width` x `height` centered inside `area`, clipped to fit
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect::new(
        area.x + (area.width - w) / 2,
        area.y + (area.height - h) / 2,
        w,
        h,
    )
}
