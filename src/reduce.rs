use crate::model::{Record, ReconciliationIndex, SelectionIndex};
use crate::observe::PipelineObserver;

/// Picks the record with the greatest count.
///
/// The first record always seeds the running maximum, even when its count is
/// not numeric (it then ranks lowest). Later records with a non-numeric count
/// are skipped and ties keep the earlier record. Returns `None` for an empty
/// dataset.
pub fn best_record(dataset: &[Record]) -> Option<&Record> {
    let (first, rest) = dataset.split_first()?;
    let mut best = first;
    let mut max_count = first.count_value().unwrap_or(i64::MIN);

    for record in rest {
        let Some(count) = record.count_value() else {
            continue;
        };
        if count > max_count {
            max_count = count;
            best = record;
        }
    }
    Some(best)
}

/// Reduces every dataset of the index to its best record. Identifiers with an
/// empty dataset are left out.
pub fn select_best<O>(index: &ReconciliationIndex, observer: &O) -> SelectionIndex
where
    O: PipelineObserver + ?Sized,
{
    let selection: SelectionIndex = index
        .iter()
        .filter_map(|(identifier, dataset)| {
            best_record(dataset).map(|record| (identifier.clone(), record.clone()))
        })
        .collect();
    observer.selection_reduced(selection.len());
    selection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::TracingObserver;

    fn record(count: &str, name: &str) -> Record {
        Record {
            identifier: "123456789012".into(),
            full_name: name.into(),
            consignee: String::new(),
            net_weight: "1".into(),
            gross_weight: String::new(),
            count: count.into(),
            change_note: String::new(),
            country: String::new(),
        }
    }

    fn selected_name(dataset: &[Record]) -> Option<&str> {
        best_record(dataset).map(|record| record.full_name.as_str())
    }

    #[test]
    fn highest_numeric_count_wins() {
        let dataset = [
            record("10", "a"),
            record("bad", "b"),
            record("25", "c"),
            record("7", "d"),
        ];
        assert_eq!(selected_name(&dataset), Some("c"));
    }

    #[test]
    fn single_record_is_selected() {
        assert_eq!(selected_name(&[record("5", "only")]), Some("only"));
        assert_eq!(selected_name(&[record("n/a", "only")]), Some("only"));
    }

    #[test]
    fn ties_keep_the_first_record() {
        let dataset = [record("25", "a"), record("25", "b")];
        assert_eq!(selected_name(&dataset), Some("a"));
    }

    #[test]
    fn non_numeric_first_record_ranks_lowest() {
        let dataset = [record("bad", "a"), record("-3", "b")];
        assert_eq!(selected_name(&dataset), Some("b"));

        let dataset = [record("bad", "a"), record("also bad", "b")];
        assert_eq!(selected_name(&dataset), Some("a"));
    }

    #[test]
    fn empty_datasets_are_left_out() {
        let mut index = ReconciliationIndex::new();
        index.insert("111111111111".into(), Vec::new());
        index.insert("123456789012".into(), vec![record("3", "a"), record("8", "b")]);

        let selection = select_best(&index, &TracingObserver);
        assert_eq!(selection.len(), 1);
        assert_eq!(selection["123456789012"].full_name, "b");
    }
}
