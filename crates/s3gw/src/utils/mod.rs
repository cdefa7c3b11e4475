pub mod crypto;

use std::future::Future;
use std::pin::Pin;

pub type SyncBoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + Sync + 'a>>;

/// Sorts pairs by their first element, keeping the relative order of equal keys.
pub fn stable_sort_by_first<T, U>(v: &mut [(T, U)])
where
    T: Ord,
{
    v.sort_by(|lhs, rhs| lhs.0.cmp(&rhs.0));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_sort() {
        let mut v = vec![("b", 1), ("a", 2), ("b", 0), ("a", 1)];
        stable_sort_by_first(&mut v);
        assert_eq!(v, [("a", 2), ("a", 1), ("b", 1), ("b", 0)]);
    }
}
