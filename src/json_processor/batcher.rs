use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRange {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub is_last: bool,
}

impl BatchRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A slice of collected entries sent as one request.
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
    pub range: &'a BatchRange,
    pub entries: &'a [String],
}

impl<'a> Batch<'a> {
    pub fn join(&self, delimiter: &str) -> String {
        join_batch(self.entries, delimiter)
    }
}

pub struct BatchPlanner {
    batch_size: usize,
}

impl BatchPlanner {
    /// A zero batch size is treated as one entry per batch.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn calculate_batches(&self, total_entries: usize) -> Vec<BatchRange> {
        let mut batches = Vec::with_capacity(self.batch_count(total_entries));
        let mut start = 0;
        let mut index = 0;

        while start < total_entries {
            let end = (start + self.batch_size).min(total_entries);
            batches.push(BatchRange {
                index,
                start,
                end,
                is_last: end >= total_entries,
            });
            start = end;
            index += 1;
        }

        batches
    }

    pub fn batch_count(&self, total_entries: usize) -> usize {
        total_entries.div_ceil(self.batch_size)
    }

    pub fn batches<'a>(&self, ranges: &'a [BatchRange], entries: &'a [String]) -> Vec<Batch<'a>> {
        ranges
            .iter()
            .map(|range| Batch {
                range,
                entries: &entries[range.start..range.end],
            })
            .collect()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

pub fn join_batch(entries: &[String], delimiter: &str) -> String {
    entries.join(delimiter)
}

/// Splits a completion on the delimiter. Segments are kept verbatim.
pub fn split_response(response: &str, delimiter: &str) -> Vec<String> {
    response.split(delimiter).map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("条目{}", i)).collect()
    }

    #[test]
    fn test_batch_count_is_ceiling() {
        let planner = BatchPlanner::new(30);
        assert_eq!(planner.calculate_batches(0).len(), 0);
        assert_eq!(planner.calculate_batches(1).len(), 1);
        assert_eq!(planner.calculate_batches(30).len(), 1);
        assert_eq!(planner.calculate_batches(31).len(), 2);
        assert_eq!(planner.calculate_batches(95).len(), 4);
        assert_eq!(planner.batch_count(95), 4);
    }

    #[test]
    fn test_batches_concatenate_to_original() {
        for (total, size) in [(0, 3), (7, 3), (9, 3), (10, 1), (4, 100)] {
            let list = entries(total);
            let planner = BatchPlanner::new(size);
            let ranges = planner.calculate_batches(list.len());
            let rebuilt: Vec<String> = planner
                .batches(&ranges, &list)
                .iter()
                .flat_map(|b| b.entries.iter().cloned())
                .collect();
            assert_eq!(rebuilt, list);
            assert!(ranges.iter().all(|r| r.len() <= size && !r.is_empty()));
        }
    }

    #[test]
    fn test_last_flag() {
        let ranges = BatchPlanner::new(2).calculate_batches(5);
        let flags: Vec<bool> = ranges.iter().map(|r| r.is_last).collect();
        assert_eq!(flags, vec![false, false, true]);
        assert_eq!(ranges[2].start, 4);
        assert_eq!(ranges[2].end, 5);
    }

    #[test]
    fn test_zero_batch_size_clamped() {
        let planner = BatchPlanner::new(0);
        assert_eq!(planner.batch_size(), 1);
        assert_eq!(planner.calculate_batches(3).len(), 3);
    }

    #[test]
    fn test_join_and_split() {
        let list = vec!["你好".to_string(), "第一行\n第二行".to_string(), "".to_string()];
        let joined = join_batch(&list, "\n🚀");
        assert_eq!(joined, "你好\n🚀第一行\n第二行\n🚀");
        assert_eq!(split_response(&joined, "\n🚀"), list);
    }

    #[test]
    fn test_split_without_delimiter_is_single_segment() {
        assert_eq!(split_response("Hello", "\n🚀"), vec!["Hello"]);
    }
}
