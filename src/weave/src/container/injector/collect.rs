use std::any::{self, Any};
use std::collections::{LinkedList, VecDeque};

use crate::collection::Collection;
use crate::container::injector::InjectorError;

/// A type which can be built from a resolved [`Collection`].
pub trait FromCollection: Sized {
    /// # Errors
    ///
    /// Returns [`InjectorError::IncompatibleInstance`] if an element has an
    /// unexpected type.
    fn from_collection(collection: &Collection) -> Result<Self, InjectorError>;
}

impl FromCollection for Collection {
    fn from_collection(collection: &Collection) -> Result<Self, InjectorError> {
        Ok(collection.clone())
    }
}

macro_rules! impl_from_collection_for_sequences {
    ($($collection:ident),*) => {
        $(
            impl<T> FromCollection for $collection<T>
            where
                T: Any + Clone + Send + Sync,
            {
                fn from_collection(collection: &Collection) -> Result<Self, InjectorError> {
                    collection
                        .iter()
                        .map(|instance| {
                            instance.cloned::<T>().ok_or_else(|| InjectorError::IncompatibleInstance {
                                service_type: collection.service_type().clone(),
                                expected: any::type_name::<T>().to_string(),
                                actual: instance.type_name(),
                            })
                        })
                        .collect()
                }
            }
        )*
    };
}

impl_from_collection_for_sequences!(Vec, VecDeque, LinkedList);

#[cfg(test)]
mod tests {
    use crate::instance::Instance;
    use crate::key::ServiceType;

    use super::*;

    #[test]
    fn from_collection_preserves_order() {
        let collection = Collection::new(
            ServiceType::of::<i32>(),
            vec![Instance::new(1i32), Instance::new(2i32), Instance::new(3i32)],
        );
        let vec: Vec<i32> = FromCollection::from_collection(&collection).unwrap();
        assert_eq!(vec, [1, 2, 3]);
        let deque: VecDeque<i32> = FromCollection::from_collection(&collection).unwrap();
        assert_eq!(deque.back(), Some(&3));
    }

    #[test]
    fn from_collection_fails_on_incompatible_element() {
        let collection = Collection::new(
            ServiceType::of::<i32>(),
            vec![Instance::new(1i32), Instance::new("two")],
        );
        let res: Result<Vec<i32>, _> = FromCollection::from_collection(&collection);
        assert!(matches!(
            res,
            Err(InjectorError::IncompatibleInstance { actual: "&str", .. })
        ));
    }
}
