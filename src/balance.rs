// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 The Cashbook Authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Running-balance arithmetic.

use crate::entry::EntryKind;
use crate::error::LedgerError;
use rust_decimal::Decimal;

/// Computes the balance after applying an entry to the last balance.
///
/// Inputs add, outputs subtract. The caller supplies `Decimal::ZERO` as
/// `last` for an empty book and performs the actual write; this function
/// only decides whether the entry is arithmetically acceptable.
///
/// # Errors
///
/// - [`LedgerError::InvalidAmount`] if `amount` is zero or negative
/// - [`LedgerError::InsufficientBalance`] if an output would drive the
///   balance below zero
pub fn next_balance(
    last: Decimal,
    kind: EntryKind,
    amount: Decimal,
) -> Result<Decimal, LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount);
    }
    match kind {
        EntryKind::Input => Ok(last + amount),
        EntryKind::Output => {
            let next = last - amount;
            if next < Decimal::ZERO {
                Err(LedgerError::InsufficientBalance)
            } else {
                Ok(next)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::next_balance;
    use crate::entry::EntryKind;
    use crate::error::LedgerError;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn inputs_add_and_outputs_subtract() {
        assert_eq!(next_balance(dec!(0), EntryKind::Input, dec!(100)), Ok(dec!(100)));
        assert_eq!(next_balance(dec!(100), EntryKind::Output, dec!(30)), Ok(dec!(70)));
    }

    #[test]
    fn output_may_empty_the_book_exactly() {
        assert_eq!(next_balance(dec!(55.25), EntryKind::Output, dec!(55.25)), Ok(dec!(0)));
    }

    #[test]
    fn overdraw_is_rejected() {
        assert_eq!(
            next_balance(dec!(70), EntryKind::Output, dec!(200)),
            Err(LedgerError::InsufficientBalance)
        );
        assert_eq!(
            next_balance(Decimal::ZERO, EntryKind::Output, dec!(0.01)),
            Err(LedgerError::InsufficientBalance)
        );
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        assert_eq!(
            next_balance(dec!(10), EntryKind::Input, Decimal::ZERO),
            Err(LedgerError::InvalidAmount)
        );
        assert_eq!(
            next_balance(dec!(10), EntryKind::Output, dec!(-5)),
            Err(LedgerError::InvalidAmount)
        );
    }

    #[test]
    fn fractional_amounts_keep_exact_cents() {
        let balance = next_balance(dec!(0.10), EntryKind::Input, dec!(0.20)).unwrap();
        assert_eq!(balance, dec!(0.30));
    }
}
