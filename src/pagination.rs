#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageWindow {
    pub pages: Vec<usize>,
    pub left_ellipsis: bool,
    pub right_ellipsis: bool,
}

/// Builds the page-number strip. `current` must already lie in `1..=total`.
pub fn page_window(current: usize, total: usize, max_buttons: usize) -> PageWindow {
    if total <= max_buttons + 2 {
        return PageWindow {
            pages: (1..=total).collect(),
            left_ellipsis: false,
            right_ellipsis: false,
        };
    }

    if max_buttons == 0 {
        return PageWindow {
            pages: vec![1, total],
            left_ellipsis: true,
            right_ellipsis: true,
        };
    }

    // Interior pages are 2..=total-1; total > max_buttons + 2 so the window fits.
    let half = max_buttons / 2;
    let mut start = current.saturating_sub(half).max(2);
    let mut end = start + max_buttons - 1;
    if end > total - 1 {
        end = total - 1;
        start = end + 1 - max_buttons;
    }

    let mut pages = Vec::with_capacity(max_buttons + 2);
    pages.push(1);
    pages.extend(start..=end);
    pages.push(total);

    PageWindow {
        pages,
        left_ellipsis: start > 2,
        right_ellipsis: end < total - 1,
    }
}

pub fn page_count(len: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 1;
    }
    len.div_ceil(per_page).max(1)
}

pub fn clamp_page(page: usize, total: usize) -> usize {
    page.clamp(1, total.max(1))
}

pub fn page_slice<T>(rows: &[T], page: usize, per_page: usize) -> &[T] {
    let start = page.saturating_sub(1).saturating_mul(per_page).min(rows.len());
    let end = start.saturating_add(per_page).min(rows.len());
    &rows[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn middle_page_shows_both_gaps() {
        let window = page_window(10, 20, 3);
        assert_eq!(
            window,
            PageWindow {
                pages: vec![1, 9, 10, 11, 20],
                left_ellipsis: true,
                right_ellipsis: true,
            }
        );
    }

    #[test]
    fn short_ranges_list_every_page() {
        let window = page_window(1, 4, 5);
        assert_eq!(
            window,
            PageWindow {
                pages: vec![1, 2, 3, 4],
                left_ellipsis: false,
                right_ellipsis: false,
            }
        );
    }

    #[rstest]
    #[case(1, 20, 5, vec![1, 2, 3, 4, 5, 6, 20], false, true)]
    #[case(3, 20, 5, vec![1, 2, 3, 4, 5, 6, 20], false, true)]
    #[case(20, 20, 5, vec![1, 15, 16, 17, 18, 19, 20], true, false)]
    #[case(18, 20, 5, vec![1, 15, 16, 17, 18, 19, 20], true, false)]
    #[case(5, 8, 5, vec![1, 3, 4, 5, 6, 7, 8], true, false)]
    #[case(4, 10, 4, vec![1, 2, 3, 4, 5, 10], false, true)]
    fn windows_snap_to_edges(
        #[case] current: usize,
        #[case] total: usize,
        #[case] max_buttons: usize,
        #[case] pages: Vec<usize>,
        #[case] left: bool,
        #[case] right: bool,
    ) {
        let window = page_window(current, total, max_buttons);
        assert_eq!(window.pages, pages);
        assert_eq!(window.left_ellipsis, left);
        assert_eq!(window.right_ellipsis, right);
    }

    #[test]
    fn every_combination_is_strictly_ascending() {
        for total in 1..=30 {
            for max_buttons in 0..=9 {
                for current in 1..=total {
                    let window = page_window(current, total, max_buttons);
                    assert!(
                        window.pages.windows(2).all(|pair| pair[0] < pair[1]),
                        "current={current} total={total} max={max_buttons}: {:?}",
                        window.pages
                    );
                    assert_eq!(window.pages.first(), Some(&1));
                    assert_eq!(window.pages.last(), Some(&total));
                    if window.left_ellipsis {
                        assert!(window.pages[1] > 2);
                    }
                    if window.right_ellipsis {
                        assert!(window.pages[window.pages.len() - 2] < total - 1);
                    }
                }
            }
        }
    }

    #[test]
    fn slicing_and_counting() {
        let rows: Vec<u32> = (1..=23).collect();
        assert_eq!(page_count(rows.len(), 10), 3);
        assert_eq!(page_count(0, 10), 1);
        assert_eq!(page_slice(&rows, 3, 10), &[21, 22, 23]);
        assert_eq!(page_slice(&rows, 9, 10), &[] as &[u32]);
        assert_eq!(clamp_page(0, 3), 1);
        assert_eq!(clamp_page(7, 3), 3);
        assert_eq!(clamp_page(2, 0), 1);
    }
}
