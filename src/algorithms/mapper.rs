use crate::error::{EngineError, EngineResult};
use crate::models::{IdKind, MovieId, UserId};
use std::collections::HashMap;

/// One direction-pair of the mapping: sorted external ids plus their reverse
/// lookup. Position in `ids` is the dense index.
#[derive(Debug, Clone, Default)]
struct IndexTable {
    ids: Vec<i64>,
    positions: HashMap<i64, usize>,
}

impl IndexTable {
    fn build(ids: impl IntoIterator<Item = i64>) -> Self {
        let mut ids: Vec<i64> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();

        let positions = ids.iter().enumerate().map(|(idx, &id)| (id, idx)).collect();
        Self { ids, positions }
    }
}

/// Bidirectional mapping between database ids and embedding rows, built
/// fresh for every training run.
#[derive(Debug, Clone, Default)]
pub struct IdMapper {
    users: IndexTable,
    movies: IndexTable,
}

impl IdMapper {
    pub fn build(
        user_ids: impl IntoIterator<Item = UserId>,
        movie_ids: impl IntoIterator<Item = MovieId>,
    ) -> Self {
        Self {
            users: IndexTable::build(user_ids),
            movies: IndexTable::build(movie_ids),
        }
    }

    fn table(&self, kind: IdKind) -> &IndexTable {
        match kind {
            IdKind::User => &self.users,
            IdKind::Movie => &self.movies,
        }
    }

    pub fn to_index(&self, kind: IdKind, id: i64) -> EngineResult<usize> {
        self.table(kind)
            .positions
            .get(&id)
            .copied()
            .ok_or(EngineError::UnknownIdentifier { kind, id })
    }

    pub fn to_external(&self, kind: IdKind, index: usize) -> EngineResult<i64> {
        let table = self.table(kind);
        table
            .ids
            .get(index)
            .copied()
            .ok_or(EngineError::IndexOutOfRange {
                kind,
                index,
                len: table.ids.len(),
            })
    }

    pub fn user_index(&self, user_id: UserId) -> EngineResult<usize> {
        self.to_index(IdKind::User, user_id)
    }

    pub fn movie_index(&self, movie_id: MovieId) -> EngineResult<usize> {
        self.to_index(IdKind::Movie, movie_id)
    }

    pub fn user_id(&self, index: usize) -> EngineResult<UserId> {
        self.to_external(IdKind::User, index)
    }

    pub fn movie_id(&self, index: usize) -> EngineResult<MovieId> {
        self.to_external(IdKind::Movie, index)
    }

    pub fn num_users(&self) -> usize {
        self.users.ids.len()
    }

    pub fn num_movies(&self) -> usize {
        self.movies.ids.len()
    }

    /// Users in index order.
    pub fn user_ids(&self) -> &[UserId] {
        &self.users.ids
    }

    /// Movies in index order.
    pub fn movie_ids(&self) -> &[MovieId] {
        &self.movies.ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_sorts_and_deduplicates() {
        let mapper = IdMapper::build(vec![7, 2, 7, 5], vec![30, 10, 20, 10]);

        assert_eq!(mapper.user_ids(), &[2, 5, 7]);
        assert_eq!(mapper.movie_ids(), &[10, 20, 30]);
        assert_eq!(mapper.user_index(5).unwrap(), 1);
        assert_eq!(mapper.movie_index(30).unwrap(), 2);
    }

    #[test]
    fn test_round_trip() {
        let mapper = IdMapper::build(vec![42, -3, 9], vec![1000, 5, 77, 12]);

        for kind in [IdKind::User, IdKind::Movie] {
            let ids = match kind {
                IdKind::User => mapper.user_ids().to_vec(),
                IdKind::Movie => mapper.movie_ids().to_vec(),
            };
            for (idx, id) in ids.iter().enumerate() {
                assert_eq!(mapper.to_external(kind, mapper.to_index(kind, *id).unwrap()).unwrap(), *id);
                assert_eq!(mapper.to_index(kind, mapper.to_external(kind, idx).unwrap()).unwrap(), idx);
            }
        }
    }

    #[test]
    fn test_unknown_identifier() {
        let mapper = IdMapper::build(vec![1], vec![10]);

        let err = mapper.to_index(IdKind::Movie, 11).unwrap_err();
        assert!(matches!(err, EngineError::UnknownIdentifier { kind: IdKind::Movie, id: 11 }));
        assert!(matches!(
            mapper.user_index(2),
            Err(EngineError::UnknownIdentifier { kind: IdKind::User, id: 2 })
        ));
    }

    #[test]
    fn test_index_out_of_range() {
        let mapper = IdMapper::build(vec![1, 2], vec![10]);

        let err = mapper.to_external(IdKind::User, 2).unwrap_err();
        assert!(matches!(
            err,
            EngineError::IndexOutOfRange { kind: IdKind::User, index: 2, len: 2 }
        ));
    }

    #[test]
    fn test_same_input_same_mapping() {
        let a = IdMapper::build(vec![3, 1, 2], vec![9, 8]);
        let b = IdMapper::build(vec![2, 3, 1], vec![8, 9]);
        assert_eq!(a.user_ids(), b.user_ids());
        assert_eq!(a.movie_ids(), b.movie_ids());
    }
}
