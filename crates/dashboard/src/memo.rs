/// Single-slot memo: keeps the last computed value until the key changes.
#[derive(Debug, Clone)]
pub struct Memo<K, V> {
    slot: Option<(K, V)>,
    computations: usize,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            slot: None,
            computations: 0,
        }
    }
}

impl<K: PartialEq + Clone, V> Memo<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute<F>(&mut self, key: &K, compute: F) -> &V
    where
        F: FnOnce(&K) -> V,
    {
        let hit = matches!(&self.slot, Some((k, _)) if k == key);
        if !hit {
            self.computations += 1;
            self.slot = None;
        }
        let (_, value) = self.slot.get_or_insert_with(|| (key.clone(), compute(key)));
        value
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        match &self.slot {
            Some((k, v)) if k == key => Some(v),
            _ => None,
        }
    }

    pub fn invalidate(&mut self) {
        self.slot = None;
    }

    /// How many times the value has been (re)computed.
    pub fn computations(&self) -> usize {
        self.computations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recomputes_only_when_key_changes() {
        let mut memo: Memo<(u32, &str), String> = Memo::new();
        let compute = |k: &(u32, &str)| format!("{}-{}", k.0, k.1);

        assert_eq!(memo.get_or_compute(&(1, "day"), compute), "1-day");
        assert_eq!(memo.get_or_compute(&(1, "day"), compute), "1-day");
        assert_eq!(memo.computations(), 1);

        assert_eq!(memo.get_or_compute(&(2, "day"), compute), "2-day");
        assert_eq!(memo.computations(), 2);
        assert!(memo.get(&(1, "day")).is_none());

        memo.invalidate();
        memo.get_or_compute(&(2, "day"), compute);
        assert_eq!(memo.computations(), 3);
    }
}
