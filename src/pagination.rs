/// One page of an in-memory list. Pages are 1-based.
#[derive(Debug)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<'_, T> {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// 1-based position of the first item on this page, 0 when empty.
    pub fn first_position(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            (self.page - 1) * self.per_page + 1
        }
    }

    pub fn last_position(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            self.first_position() + self.items.len() - 1
        }
    }
}

/// Slices `items` to the requested page, clamping the page into range.
pub fn paginate<T>(items: &[T], requested: usize, per_page: usize) -> Page<'_, T> {
    let per_page = per_page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page).max(1);
    let page = requested.clamp(1, total_pages);
    let start = ((page - 1) * per_page).min(total_items);
    let end = (start + per_page).min(total_items);

    Page {
        items: &items[start..end],
        page,
        per_page,
        total_items,
        total_pages,
    }
}
