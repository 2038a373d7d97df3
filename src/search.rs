// 🔍 Client-side search over the last-fetched list
//
// Each checkout modal owns one SearchList. Filtering never refetches; the
// list is only replaced when the server sends a fresh copy.

/// Items that can be matched by the checkout search box
pub trait Searchable {
    /// Text the query is matched against (names, host, CNIC)
    fn search_key(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct SearchList<T> {
    items: Vec<T>,
    /// Lowercased search keys, precomputed once per fetch
    keys: Vec<String>,
    visible: Vec<usize>,
    query: String,
}

impl<T> Default for SearchList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            keys: Vec::new(),
            visible: Vec::new(),
            query: String::new(),
        }
    }
}

impl<T: Searchable> SearchList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list with a freshly fetched copy and clear the query
    pub fn replace(&mut self, items: Vec<T>) {
        self.keys = items.iter().map(|i| i.search_key().to_lowercase()).collect();
        self.items = items;
        self.query.clear();
        self.visible = (0..self.items.len()).collect();
    }

    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }

    /// Apply a case-insensitive substring filter.
    ///
    /// Only an empty query shows every item; whitespace is matched literally.
    pub fn apply(&mut self, query: &str) {
        self.query = query.to_string();
        let needle = query.to_lowercase();

        self.visible = if needle.is_empty() {
            (0..self.items.len()).collect()
        } else {
            self.keys
                .iter()
                .enumerate()
                .filter(|(_, key)| key.contains(&needle))
                .map(|(i, _)| i)
                .collect()
        };
    }

    pub fn push_char(&mut self, c: char) {
        let mut query = self.query.clone();
        query.push(c);
        self.apply(&query);
    }

    pub fn pop_char(&mut self) {
        let mut query = self.query.clone();
        query.pop();
        self.apply(&query);
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items currently shown, in fetch order
    pub fn visible(&self) -> impl Iterator<Item = &T> {
        self.visible.iter().map(move |&i| &self.items[i])
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    /// `n`-th visible item
    pub fn visible_at(&self, n: usize) -> Option<&T> {
        self.visible.get(n).map(|&i| &self.items[i])
    }

    /// True when the "no results" placeholder should be rendered: the list
    /// has items but the query hides all of them.
    pub fn shows_no_results(&self) -> bool {
        !self.items.is_empty() && self.visible.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row(&'static str);

    impl Searchable for Row {
        fn search_key(&self) -> String {
            self.0.to_string()
        }
    }

    fn sample() -> SearchList<Row> {
        let mut list = SearchList::new();
        list.replace(vec![
            Row("Bilal Ahmed Maj. Tariq 6110112345679"),
            Row("Sana Iqbal Col. Haider 3520212345671"),
            Row("Usman Tariq Capt. Ali 4210198765432"),
        ]);
        list
    }

    #[test]
    fn test_empty_query_shows_all() {
        let mut list = sample();
        list.apply("");
        assert_eq!(list.visible_count(), 3);
        assert!(!list.shows_no_results());
    }

    #[test]
    fn test_case_insensitive_substring() {
        let mut list = sample();
        list.apply("TARIQ");

        let shown: Vec<_> = list.visible().cloned().collect();
        assert_eq!(
            shown,
            vec![
                Row("Bilal Ahmed Maj. Tariq 6110112345679"),
                Row("Usman Tariq Capt. Ali 4210198765432"),
            ]
        );
    }

    #[test]
    fn test_matches_cnic_digits() {
        let mut list = sample();
        list.apply("35202");
        assert_eq!(list.visible_count(), 1);
        assert_eq!(list.visible_at(0), Some(&Row("Sana Iqbal Col. Haider 3520212345671")));
    }

    #[test]
    fn test_no_results_placeholder_appears_once_and_clears() {
        let mut list = sample();

        for c in "zz".chars() {
            list.push_char(c);
            assert!(list.shows_no_results());
        }

        list.pop_char();
        list.pop_char();
        assert!(!list.shows_no_results());
        assert_eq!(list.visible_count(), 3);
    }

    #[test]
    fn test_whitespace_is_part_of_the_query() {
        let mut list = sample();
        list.apply("5671 ");
        assert_eq!(list.visible_count(), 0);
        assert!(list.shows_no_results());

        list.apply("iqbal col");
        assert_eq!(list.visible_count(), 1);

        let mut single = SearchList::new();
        single.replace(vec![Row("Nospace")]);
        single.apply(" ");
        assert_eq!(single.visible_count(), 0);
        assert!(single.shows_no_results());
    }

    #[test]
    fn test_empty_list_has_no_placeholder() {
        let mut list: SearchList<Row> = SearchList::new();
        list.apply("anything");
        assert!(!list.shows_no_results());
        assert!(list.is_empty());
    }

    #[test]
    fn test_replace_resets_query() {
        let mut list = sample();
        list.apply("sana");
        list.replace(vec![Row("Fresh Row")]);
        assert_eq!(list.query(), "");
        assert_eq!(list.visible_count(), 1);
    }
}
