//! Value model: tagged values, list storage shapes, class objects, iterators.

pub mod iter;
pub mod storage;
pub mod type_obj;
pub mod value;

pub use iter::IterState;
pub use storage::SequenceStorage;
pub use type_obj::{InstanceObject, TypeObject, is_subtype, same_type};
pub use value::{
    BuiltinFunction, DictKey, DictStorage, FastHashMap, KwArgs, NativeFn, OrderedMap, Value,
    dict_new, fast_map_new, fast_map_with_capacity, format_float, format_int, ordered_map_new,
    repr_value, str_value, value_lt, values_equal,
};
