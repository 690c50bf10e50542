pub trait IntersectAble<Target, Result, Parameter = ()> {
  fn intersect(&self, other: &Target, param: &Parameter) -> Result;
}

/// implement the reversed direction of an intersect relation by forwarding to the
/// existing implementation, so both `a.intersect(b)` and `b.intersect(a)` are available.
#[macro_export]
macro_rules! intersect_reverse {
  ($self_item: ty, $result: ty, $param: ty, $target: ty) => {
    impl $crate::IntersectAble<$target, $result, $param> for $self_item {
      #[inline]
      fn intersect(&self, other: &$target, p: &$param) -> $result {
        $crate::IntersectAble::<$self_item, $result, $param>::intersect(other, self, p)
      }
    }
  };
}
