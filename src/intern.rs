use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;
use std::thread_local;

thread_local! {
    static INTERNER: RefCell<FxHashMap<String, Rc<String>>> = RefCell::new(FxHashMap::default());
}

// Identifiers, dict keys and literal strings recur constantly in a running
// script; hand out one shared Rc per distinct spelling.
pub fn intern(s: &str) -> Rc<String>
{
    INTERNER.with(|map| {
        let mut guard = map.borrow_mut();
        if let Some(existing) = guard.get(s)
        {
            return existing.clone();
        }
        let rc = Rc::new(s.to_string());
        guard.insert(s.to_string(), rc.clone());
        rc
    })
}

pub fn intern_owned(s: String) -> Rc<String>
{
    INTERNER.with(|map| {
        let mut guard = map.borrow_mut();
        if let Some(existing) = guard.get(s.as_str())
        {
            return existing.clone();
        }
        let rc = Rc::new(s.clone());
        guard.insert(s, rc.clone());
        rc
    })
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn interned_strings_share_storage()
    {
        let a = intern("count");
        let b = intern_owned("count".to_string());
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(a.as_str(), "count");
    }
}
