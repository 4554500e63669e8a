use crate::domain::ordering::compare_items;
use crate::domain::study::Study;
use std::cmp::Ordering;
use std::str::FromStr;

/// Fields available for sorting study lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Order,
    Title,
    Created,
    Updated,
    ViewCount,
    TagCount,
}

/// Sort order direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "order" => Ok(SortField::Order),
            "title" => Ok(SortField::Title),
            "created" => Ok(SortField::Created),
            "updated" => Ok(SortField::Updated),
            "views" | "view-count" => Ok(SortField::ViewCount),
            "tags" | "tag-count" => Ok(SortField::TagCount),
            _ => Err(format!(
                "Invalid sort field '{}'. Valid fields: order, title, created, updated, view-count, tag-count",
                s
            )),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Ascending),
            "desc" => Ok(SortOrder::Descending),
            _ => Err(format!(
                "Invalid sort order '{}'. Valid orders: asc, desc",
                s
            )),
        }
    }
}

/// Sorts studies in-place by the given field and direction
///
/// # Examples
/// ```
/// use chartq_core::domain::sorting::{sort_studies, SortField, SortOrder};
/// use chartq_core::domain::study::Study;
///
/// let mut studies = vec![
///     Study::new("C".to_string(), 3.0),
///     Study::new("A".to_string(), 1.0),
///     Study::new("B".to_string(), 2.0),
/// ];
///
/// sort_studies(&mut studies, SortField::Order, SortOrder::Ascending);
/// assert_eq!(studies[0].title, "A");
/// ```
pub fn sort_studies(studies: &mut [Study], field: SortField, order: SortOrder) {
    studies.sort_by(|a, b| {
        let cmp = match field {
            SortField::Order => compare_items(a, b),
            SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortField::Created => a.created_at.cmp(&b.created_at),
            SortField::Updated => a.updated_at.cmp(&b.updated_at),
            SortField::ViewCount => a.view_count.cmp(&b.view_count),
            SortField::TagCount => a.tags.len().cmp(&b.tags.len()),
        };

        match order {
            SortOrder::Ascending => cmp,
            SortOrder::Descending => cmp.reverse(),
        }
    });
}

/// Top `limit` studies by view count, most viewed first
///
/// Ties keep display order so the dashboard is stable between refreshes.
pub fn most_viewed(studies: &[Study], limit: usize) -> Vec<&Study> {
    let mut ranked: Vec<&Study> = studies.iter().collect();
    ranked.sort_by(|a, b| match b.view_count.cmp(&a.view_count) {
        Ordering::Equal => compare_items(*a, *b),
        other => other,
    });
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::study::Tag;

    #[test]
    fn test_sort_by_order_ascending() {
        let mut studies = vec![
            Study::new("C".to_string(), 3.0),
            Study::new("A".to_string(), 0.5),
            Study::new("B".to_string(), 2.25),
        ];

        sort_studies(&mut studies, SortField::Order, SortOrder::Ascending);

        assert_eq!(studies[0].title, "A");
        assert_eq!(studies[1].title, "B");
        assert_eq!(studies[2].title, "C");
    }

    #[test]
    fn test_sort_by_order_descending() {
        let mut studies = vec![
            Study::new("A".to_string(), 1.0),
            Study::new("B".to_string(), 2.0),
            Study::new("C".to_string(), 3.0),
        ];

        sort_studies(&mut studies, SortField::Order, SortOrder::Descending);

        assert_eq!(studies[0].title, "C");
        assert_eq!(studies[2].title, "A");
    }

    #[test]
    fn test_sort_by_title_case_insensitive() {
        let mut studies = vec![
            Study::new("zebra".to_string(), 1.0),
            Study::new("Apple".to_string(), 2.0),
            Study::new("BANANA".to_string(), 3.0),
        ];

        sort_studies(&mut studies, SortField::Title, SortOrder::Ascending);

        assert_eq!(studies[0].title, "Apple");
        assert_eq!(studies[1].title, "BANANA");
        assert_eq!(studies[2].title, "zebra");
    }

    #[test]
    fn test_sort_by_tag_count() {
        let mut tagged = Study::new("Two tags".to_string(), 1.0);
        tagged.set_tags(vec![Tag::new("1", "Trend"), Tag::new("2", "Volume")]);
        let mut studies = vec![tagged, Study::new("None".to_string(), 2.0)];

        sort_studies(&mut studies, SortField::TagCount, SortOrder::Ascending);

        assert_eq!(studies[0].title, "None");
    }

    #[test]
    fn test_most_viewed() {
        let mut a = Study::new("A".to_string(), 1.0);
        a.view_count = 10;
        let mut b = Study::new("B".to_string(), 2.0);
        b.view_count = 50;
        let mut c = Study::new("C".to_string(), 3.0);
        c.view_count = 10;
        let studies = vec![c, b, a];

        let top = most_viewed(&studies, 2);

        assert_eq!(top.len(), 2);
        assert_eq!(top[0].title, "B");
        assert_eq!(top[1].title, "A");
    }

    #[test]
    fn test_parse_sort_field() {
        assert_eq!("order".parse::<SortField>().unwrap(), SortField::Order);
        assert_eq!("VIEWS".parse::<SortField>().unwrap(), SortField::ViewCount);
        assert!("bogus".parse::<SortField>().is_err());
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Descending);
    }
}
