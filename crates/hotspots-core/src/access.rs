//! Review ownership rule.
//!
//! Only the identity that created a review, or an admin, may update or delete
//! it. Creation and reads are not gated here.

use crate::{Error, Result, identity::Identity, review::Review};

/// Decide whether `requester_id` may mutate `review`.
pub fn authorize_review_mutation(
  review: &Review,
  requester_id: &str,
  requester_is_admin: bool,
) -> Result<()> {
  if requester_is_admin {
    return Ok(());
  }
  if review.user_id != requester_id {
    tracing::debug!(
      review_id = %review.review_id,
      requester = requester_id,
      "review mutation refused: not the owner"
    );
    return Err(Error::Forbidden(format!(
      "review {} belongs to another user",
      review.review_id
    )));
  }
  Ok(())
}

/// [`authorize_review_mutation`] for a verified [`Identity`].
pub fn authorize(review: &Review, requester: &Identity) -> Result<()> {
  authorize_review_mutation(review, &requester.user_id, requester.is_admin())
}
