use sea_orm::{ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, Select};
use serde::Serialize;

/// Paginated list body: `{data, current_page, last_page, per_page, total}`.
#[derive(Clone, Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub current_page: usize,
    pub last_page: usize,
    pub per_page: usize,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, current_page: usize, per_page: usize, total: usize) -> Self {
        Self {
            data,
            current_page,
            last_page: last_page(total, per_page),
            per_page,
            total,
        }
    }

    /// Replaces the rows while keeping the page metadata.
    pub fn with_data<U>(self, data: Vec<U>) -> Page<U> {
        Page {
            data,
            current_page: self.current_page,
            last_page: self.last_page,
            per_page: self.per_page,
            total: self.total,
        }
    }

    /// Converts each row while keeping the page metadata.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            current_page: self.current_page,
            last_page: self.last_page,
            per_page: self.per_page,
            total: self.total,
        }
    }
}

/// Last page number. An empty list still has one page.
pub fn last_page(total: usize, per_page: usize) -> usize {
    if per_page == 0 || total == 0 {
        return 1;
    }
    (total + per_page - 1) / per_page
}

/// Clamps a requested 1-based page number.
pub fn page_number(requested: Option<usize>) -> usize {
    requested.filter(|p| *p > 0).unwrap_or(1)
}

/// Fetches page `page` (1-based) of `select`. Pages past the end are empty.
pub async fn paginate<C, E>(
    db: &C,
    select: Select<E>,
    page: usize,
    per_page: usize,
) -> Result<Page<E::Model>, DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: Sync,
{
    let per_page = per_page.max(1);
    let paginator = select.paginate(db, per_page);
    let total = paginator.num_items().await?;
    if page > last_page(total, per_page) {
        return Ok(Page::new(Vec::new(), page, per_page, total));
    }
    let data = paginator.fetch_page(page - 1).await?;
    Ok(Page::new(data, page, per_page, total))
}
