use uuid::Uuid;

use scribe_types::models::Post;

use crate::error::ApiError;
use crate::posts::PostStore;

/// Which posts a listing shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    All,
    MineOf(Uuid),
    TitleContains(String),
}

/// Listing entry point shared by the feed, "my posts" and search pages.
/// Results are always newest first.
pub fn browse(store: &PostStore<'_>, filter: &PostFilter) -> Result<Vec<Post>, ApiError> {
    match filter {
        PostFilter::All => store.list_all(),
        PostFilter::MineOf(user_id) => store.list_owned_by(*user_id),
        PostFilter::TitleContains(text) => store.search_by_title(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{CredentialStore, test_hasher};
    use scribe_db::Database;
    use scribe_types::models::SessionUser;

    #[test]
    fn every_filter_is_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let hasher = test_hasher();
        let credentials = CredentialStore::new(&db, &hasher);
        let ada: SessionUser = credentials.register("Ada", "ada", "ada@x", "pw").unwrap().into();
        let bob: SessionUser = credentials.register("Bob", "bob", "bob@x", "pw").unwrap().into();

        let store = PostStore::new(&db);
        let p1 = store.create(Some(&ada), "Notes one", "", None).unwrap();
        let p2 = store.create(Some(&bob), "Other", "", None).unwrap();
        let p3 = store.create(Some(&ada), "notes two", "", None).unwrap();

        let ids = |filter: PostFilter| -> Vec<Uuid> {
            browse(&store, &filter).unwrap().into_iter().map(|p| p.id).collect()
        };

        assert_eq!(ids(PostFilter::All), vec![p3, p2, p1]);
        assert_eq!(ids(PostFilter::MineOf(ada.id)), vec![p3, p1]);
        assert_eq!(ids(PostFilter::MineOf(bob.id)), vec![p2]);
        assert_eq!(ids(PostFilter::TitleContains("NOTES".into())), vec![p3, p1]);
        assert_eq!(ids(PostFilter::TitleContains(String::new())), ids(PostFilter::All));
    }
}
