//! May-alias queries derived from an already-solved points-to result:
//! two base variables may alias a field/array access iff their
//! points-to sets intersect.

use crate::features::points_to::{Context, CsVar, Pointer, PointsToResult, PointsToSet};
use crate::shared::ir::{MethodId, VarId};

pub fn cs_var_pts(pts: &PointsToResult, ctx: &Context, method: MethodId, var: VarId) -> PointsToSet {
    match pts.manager.var_id(&CsVar { context: ctx.clone(), var, method }) {
        Some(id) => pts.pts_of(&Pointer::Var(id)),
        None => PointsToSet::new(),
    }
}

pub fn may_alias(a: &PointsToSet, b: &PointsToSet) -> bool {
    a.iter().any(|obj| b.contains(obj))
}
