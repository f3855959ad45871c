use {
    super::eth,
    num::{BigInt, Zero},
};

/// Fee statistics of a single block, in gwei.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Estimate {
    pub base_fee_per_gas: eth::Gwei,
    /// Mean of `gas_price - base_fee_per_gas` over all transactions that carry
    /// a gas price.
    pub average_priority_fee: eth::Gwei,
}

#[derive(Debug, thiserror::Error)]
pub enum MalformedBlock {
    #[error("block not found")]
    Missing,
    #[error("block has no transaction objects")]
    MissingTransactions,
}

/// Computes the fee statistics of a block.
///
/// The priority fee of a transaction is its gas price minus the base fee of
/// the block. It is not clamped, so transactions priced below the base fee pull
/// the average down. Transactions without a gas price are skipped entirely.
/// All arithmetic happens on wei integers and only the final average (rounded
/// towards zero) is converted to gwei.
pub fn estimate(block: &eth::Block) -> Result<Estimate, MalformedBlock> {
    let transactions = block
        .transactions
        .as_deref()
        .ok_or(MalformedBlock::MissingTransactions)?;

    let base_fee_per_gas = block.base_fee_per_gas.unwrap_or_default().to_big_int();
    let (sum, count) = transactions
        .iter()
        .filter_map(|tx| tx.gas_price)
        .fold((BigInt::zero(), 0_u64), |(sum, count), gas_price| {
            (sum + (gas_price.to_big_int() - &base_fee_per_gas), count + 1)
        });
    let average_priority_fee = if count > 0 {
        sum / BigInt::from(count)
    } else {
        BigInt::zero()
    };

    Ok(Estimate {
        base_fee_per_gas: eth::Gwei::from_wei(base_fee_per_gas),
        average_priority_fee: eth::Gwei::from_wei(average_priority_fee),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GWEI: u64 = 1_000_000_000;

    fn block(base_fee_per_gas: Option<u64>, gas_prices: &[Option<u64>]) -> eth::Block {
        eth::Block {
            number: eth::BlockNo(100),
            base_fee_per_gas: base_fee_per_gas.map(eth::Wei::from),
            transactions: Some(
                gas_prices
                    .iter()
                    .map(|gas_price| eth::Tx {
                        gas_price: gas_price.map(eth::Wei::from),
                    })
                    .collect(),
            ),
        }
    }

    fn gwei(wei: i64) -> eth::Gwei {
        eth::Gwei::from_wei(BigInt::from(wei))
    }

    #[test]
    fn averages_priority_fees() {
        let block = block(
            Some(GWEI),
            &[
                Some(GWEI),
                Some(2 * GWEI),
                Some(3 * GWEI),
                Some(4 * GWEI),
                Some(5 * GWEI),
            ],
        );

        let estimate = estimate(&block).unwrap();
        assert_eq!(estimate.base_fee_per_gas, gwei(1_000_000_000));
        assert_eq!(estimate.average_priority_fee, gwei(2_000_000_000));
        assert_eq!(estimate.average_priority_fee.to_f64(), Some(2.));
        assert_eq!(estimate.base_fee_per_gas.to_f64(), Some(1.));
    }

    #[test]
    fn skips_transactions_without_gas_price() {
        // Only the two priced transactions count: (1 + 3) / 2 gwei.
        let block = block(
            Some(GWEI),
            &[None, Some(2 * GWEI), None, Some(4 * GWEI), None],
        );

        let estimate = estimate(&block).unwrap();
        assert_eq!(estimate.average_priority_fee, gwei(2_000_000_000));
    }

    #[test]
    fn keeps_negative_priority_fees() {
        let block = block(Some(10 * GWEI), &[Some(GWEI), Some(3 * GWEI)]);

        let estimate = estimate(&block).unwrap();
        assert_eq!(estimate.average_priority_fee, gwei(-8_000_000_000));
    }

    #[test]
    fn rounds_average_towards_zero() {
        let positive = block(Some(0), &[Some(1), Some(2)]);
        assert_eq!(estimate(&positive).unwrap().average_priority_fee, gwei(1));

        let negative = block(Some(10), &[Some(9), Some(8)]);
        assert_eq!(estimate(&negative).unwrap().average_priority_fee, gwei(-1));
    }

    #[test]
    fn average_matches_exact_integer_mean() {
        let base_fee = 7 * GWEI + 3;
        let gas_prices = (0..250_u64)
            .map(|i| Some(base_fee + i * 1_234_567 + i % 7))
            .collect::<Vec<_>>();

        let sum: u64 = gas_prices
            .iter()
            .flatten()
            .map(|gas_price| gas_price - base_fee)
            .sum();
        let expected = i64::try_from(sum / 250).unwrap();

        let estimate = estimate(&block(Some(base_fee), &gas_prices)).unwrap();
        assert_eq!(estimate.average_priority_fee, gwei(expected));
    }

    #[test]
    fn empty_block() {
        let empty = estimate(&block(Some(GWEI), &[])).unwrap();
        assert_eq!(empty.base_fee_per_gas, gwei(1_000_000_000));
        assert_eq!(empty.average_priority_fee, gwei(0));

        let unpriced = estimate(&block(Some(GWEI), &[None, None])).unwrap();
        assert_eq!(unpriced.average_priority_fee, gwei(0));
    }

    #[test]
    fn missing_base_fee_counts_as_zero() {
        let estimate = estimate(&block(None, &[Some(3 * GWEI)])).unwrap();
        assert_eq!(estimate.base_fee_per_gas, gwei(0));
        assert_eq!(estimate.average_priority_fee, gwei(3_000_000_000));
    }

    #[test]
    fn rejects_blocks_without_transaction_objects() {
        let block = eth::Block {
            transactions: None,
            ..block(Some(GWEI), &[])
        };
        assert!(matches!(
            estimate(&block),
            Err(MalformedBlock::MissingTransactions)
        ));
    }
}
